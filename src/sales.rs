//! Deal (sales opportunity) registry.
//!
//! Deals mirror the customer registry: tasks hold an optional deal id
//! and the fanout engine resolves it to a name for message text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::directory::DisplayNames;
use crate::error::{Error, Result};
use crate::storage::Storage;

const DEALS_SCHEMA_VERSION: &str = "herald.deals.v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRegistry {
    pub schema_version: String,
    pub deals: Vec<DealRecord>,
}

impl DealRegistry {
    pub fn empty() -> Self {
        Self {
            schema_version: DEALS_SCHEMA_VERSION.to_string(),
            deals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DealStore {
    storage: Storage,
}

impl DealStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn add(
        &self,
        name: &str,
        customer: Option<String>,
        amount: Option<f64>,
    ) -> Result<DealRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "deal name cannot be empty".to_string(),
            ));
        }

        let record = DealRecord {
            id: Ulid::new().to_string().to_lowercase(),
            name: name.to_string(),
            customer,
            amount,
            created_at: Utc::now(),
        };

        let mut registry = self.load()?;
        registry.deals.push(record.clone());
        self.storage
            .write_json(&self.storage.deals_file(), &registry)?;
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<DealRecord> {
        self.load()?
            .deals
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::DealNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<DealRecord>> {
        let mut deals = self.load()?.deals;
        deals.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(deals)
    }

    fn load(&self) -> Result<DealRegistry> {
        let path = self.storage.deals_file();
        if !path.exists() {
            return Ok(DealRegistry::empty());
        }
        self.storage.read_json(&path)
    }
}

impl DisplayNames for DealStore {
    fn display_name(&self, id: &str) -> Option<String> {
        self.load()
            .ok()?
            .deals
            .into_iter()
            .find(|record| record.id == id)
            .map(|record| record.name)
    }
}
