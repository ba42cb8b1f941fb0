//! User directory: uid to display-name resolution.
//!
//! The fanout engine never fails on an unresolvable uid; lookups return
//! `Option` and the message composer substitutes a placeholder. The
//! cache is an explicit, caller-owned wrapper with a bounded capacity
//! and invalidation, injected where a lookup is needed.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::Storage;

const USERS_SCHEMA_VERSION: &str = "herald.users.v1";

/// Anything that can resolve an opaque id to a display name.
///
/// Implemented by the user directory and by the customer/deal
/// registries, so the dispatcher treats all name sources uniformly.
pub trait DisplayNames {
    fn display_name(&self, id: &str) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub uid: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegistry {
    pub schema_version: String,
    pub users: Vec<UserRecord>,
}

impl UserRegistry {
    pub fn empty() -> Self {
        Self {
            schema_version: USERS_SCHEMA_VERSION.to_string(),
            users: Vec::new(),
        }
    }
}

/// File-backed user directory over `.herald/users.json`.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    storage: Storage,
}

impl UserDirectory {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn add(&self, record: UserRecord) -> Result<UserRecord> {
        let uid = record.uid.trim();
        if uid.is_empty() {
            return Err(Error::InvalidArgument("uid cannot be empty".to_string()));
        }
        if record.display_name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "display name cannot be empty".to_string(),
            ));
        }

        let mut registry = self.load()?;
        // Re-adding a uid replaces the record; the directory is the
        // source of truth for the latest profile.
        registry.users.retain(|existing| existing.uid != uid);
        let record = UserRecord {
            uid: uid.to_string(),
            display_name: record.display_name.trim().to_string(),
            email: record.email,
        };
        registry.users.push(record.clone());
        self.storage
            .write_json(&self.storage.users_file(), &registry)?;
        Ok(record)
    }

    pub fn get(&self, uid: &str) -> Result<UserRecord> {
        self.load()?
            .users
            .into_iter()
            .find(|record| record.uid == uid)
            .ok_or_else(|| Error::UserNotFound(uid.to_string()))
    }

    pub fn list(&self) -> Result<Vec<UserRecord>> {
        let mut users = self.load()?.users;
        users.sort_by(|left, right| left.uid.cmp(&right.uid));
        Ok(users)
    }

    fn load(&self) -> Result<UserRegistry> {
        let path = self.storage.users_file();
        if !path.exists() {
            return Ok(UserRegistry::empty());
        }
        self.storage.read_json(&path)
    }
}

impl DisplayNames for UserDirectory {
    fn display_name(&self, id: &str) -> Option<String> {
        self.load()
            .ok()?
            .users
            .into_iter()
            .find(|record| record.uid == id)
            .map(|record| record.display_name)
    }
}

/// Bounded display-name cache wrapping any [`DisplayNames`] source.
///
/// Holds at most `capacity` resolved names, evicting the oldest entry
/// first. Misses are not cached, so a name added after a failed lookup
/// is picked up without invalidation.
pub struct CachedNames<S> {
    source: S,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    names: HashMap<String, String>,
    order: VecDeque<String>,
}

impl<S: DisplayNames> CachedNames<S> {
    pub fn new(source: S, capacity: usize) -> Self {
        Self {
            source,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    // Cached names carry no cross-entry invariants, so a poisoned
    // guard is safe to recover.
    fn guard(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop a single cached name, forcing the next lookup through.
    pub fn invalidate(&self, id: &str) {
        let mut inner = self.guard();
        if inner.names.remove(id).is_some() {
            inner.order.retain(|cached| cached != id);
        }
    }

    /// Drop every cached name.
    pub fn clear(&self) {
        let mut inner = self.guard();
        inner.names.clear();
        inner.order.clear();
    }

    /// Number of cached entries, for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.guard().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remember(&self, id: &str, name: &str) {
        let mut inner = self.guard();
        if inner.names.contains_key(id) {
            return;
        }
        while inner.names.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.names.remove(&oldest);
                }
                None => break,
            }
        }
        inner.names.insert(id.to_string(), name.to_string());
        inner.order.push_back(id.to_string());
    }
}

impl<S: DisplayNames> DisplayNames for CachedNames<S> {
    fn display_name(&self, id: &str) -> Option<String> {
        {
            let inner = self.guard();
            if let Some(name) = inner.names.get(id) {
                return Some(name.clone());
            }
        }

        let name = self.source.display_name(id)?;
        self.remember(id, &name);
        Some(name)
    }
}
