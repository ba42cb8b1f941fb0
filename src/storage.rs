//! Storage layer for herald
//!
//! Manages persistent CRM state under a single data directory:
//!
//! ```text
//! .herald/                      # Data root (default: ./.herald)
//!   actor                       # Persisted acting uid
//!   users.json                  # User directory records
//!   customers.json              # Customer registry
//!   deals.json                  # Deal registry
//!   tasks.json                  # Task snapshot document
//!   notifications.jsonl         # Append-only notification records
//!   locks/                      # flock files, one per store
//! ```
//!
//! All document writes go through the atomic temp-file + rename pattern
//! so concurrent readers never observe partial writes; callers that
//! mutate a store hold the matching lock from the `lock` module.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Name of the data directory
pub const DATA_DIR: &str = ".herald";

/// Storage manager for herald state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the data root directory
    data_root: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at an explicit data directory.
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    /// Create storage for the conventional `.herald/` directory under `base`.
    pub fn for_base_dir(base: &Path) -> Self {
        Self::new(base.join(DATA_DIR))
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Path to the data root directory
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Path to the persisted actor identity file
    pub fn actor_file(&self) -> PathBuf {
        self.data_root.join("actor")
    }

    /// Path to the user directory document
    pub fn users_file(&self) -> PathBuf {
        self.data_root.join("users.json")
    }

    /// Path to the customer registry document
    pub fn customers_file(&self) -> PathBuf {
        self.data_root.join("customers.json")
    }

    /// Path to the deal registry document
    pub fn deals_file(&self) -> PathBuf {
        self.data_root.join("deals.json")
    }

    /// Path to the task snapshot document
    pub fn tasks_file(&self) -> PathBuf {
        self.data_root.join("tasks.json")
    }

    /// Path to the notifications file (JSONL format)
    pub fn notifications_file(&self) -> PathBuf {
        self.data_root.join("notifications.jsonl")
    }

    /// Path to the lock file guarding a named store
    pub fn lock_file(&self, store: &str) -> PathBuf {
        self.data_root.join("locks").join(format!("{store}.lock"))
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    /// Initialize the data directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_root)?;
        fs::create_dir_all(self.data_root.join("locks"))?;

        // Touch the notifications log so tailing consumers have a file
        let notifications = self.notifications_file();
        if !notifications.exists() {
            File::create(&notifications)?;
        }

        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.data_root.exists()
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    ///
    /// This ensures that concurrent readers never see partial writes.
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write data atomically using temp file + rename
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Temp file in the same directory, required for atomic rename
        let temp_path = path.with_extension("tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;

        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Append a line to a JSONL file (notifications, event feeds)
    ///
    /// Note: append is NOT atomic on its own; callers that can race hold
    /// the store's lock file first.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all records from a JSONL file
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    // =========================================================================
    // Actor persistence
    // =========================================================================

    /// Read the persisted actor uid for this data directory
    pub fn read_actor(&self) -> Option<String> {
        let path = self.actor_file();
        let raw = fs::read_to_string(&path).ok()?;
        let actor = raw.trim();
        if actor.is_empty() {
            None
        } else {
            Some(actor.to_string())
        }
    }

    /// Write the actor uid for this data directory
    pub fn write_actor(&self, actor: &str) -> Result<()> {
        fs::create_dir_all(&self.data_root)?;
        self.write_atomic(&self.actor_file(), actor.as_bytes())
    }
}
