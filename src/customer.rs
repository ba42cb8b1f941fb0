//! Customer registry.
//!
//! Customers are referenced by tasks through an optional id; the fanout
//! engine only ever needs the customer's display name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::directory::DisplayNames;
use crate::error::{Error, Result};
use crate::storage::Storage;

const CUSTOMERS_SCHEMA_VERSION: &str = "herald.customers.v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRegistry {
    pub schema_version: String,
    pub customers: Vec<CustomerRecord>,
}

impl CustomerRegistry {
    pub fn empty() -> Self {
        Self {
            schema_version: CUSTOMERS_SCHEMA_VERSION.to_string(),
            customers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerStore {
    storage: Storage,
}

impl CustomerStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn add(&self, name: &str, contact_email: Option<String>) -> Result<CustomerRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "customer name cannot be empty".to_string(),
            ));
        }

        let record = CustomerRecord {
            id: Ulid::new().to_string().to_lowercase(),
            name: name.to_string(),
            contact_email,
            created_at: Utc::now(),
        };

        let mut registry = self.load()?;
        registry.customers.push(record.clone());
        self.storage
            .write_json(&self.storage.customers_file(), &registry)?;
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<CustomerRecord> {
        self.load()?
            .customers
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<CustomerRecord>> {
        let mut customers = self.load()?.customers;
        customers.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(customers)
    }

    fn load(&self) -> Result<CustomerRegistry> {
        let path = self.storage.customers_file();
        if !path.exists() {
            return Ok(CustomerRegistry::empty());
        }
        self.storage.read_json(&path)
    }
}

impl DisplayNames for CustomerStore {
    fn display_name(&self, id: &str) -> Option<String> {
        self.load()
            .ok()?
            .customers
            .into_iter()
            .find(|record| record.id == id)
            .map(|record| record.name)
    }
}
