//! herald - CRM task notification library
//!
//! This library provides the core of a small-business CRM's task
//! subsystem: task storage plus the notification fanout engine that
//! turns every task mutation into addressed, deduplicated notification
//! records.
//!
//! # Core Concepts
//!
//! - **Tasks**: units of work with an assignee, status, and optional
//!   customer/deal references
//! - **Fanout**: one notification record per eligible recipient per
//!   mutation, composed from resolved display names
//! - **Change classification**: a priority-ordered rule table mapping
//!   an update onto exactly one change kind
//! - **Dedup**: Create-event notifications are suppressed when an
//!   identical (task, message) record already exists
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.herald.toml`
//! - `error`: Error types and result aliases
//! - `storage`: File storage and data directory management
//! - `lock`: File locking for concurrency safety
//! - `actor`: Acting-user identity resolution
//! - `task`: Task records and the task store
//! - `directory`: User directory with bounded display-name caching
//! - `customer`, `sales`: Customer and deal registries
//! - `notification`: Notification records and store
//! - `diff`: Change classification
//! - `message`: Notification message composition
//! - `recipient`: Recipient resolution rules
//! - `fanout`: The fanout dispatcher
//! - `events`: JSONL event feed for external integrations

pub mod actor;
pub mod cli;
pub mod config;
pub mod customer;
pub mod diff;
pub mod directory;
pub mod error;
pub mod events;
pub mod fanout;
pub mod lock;
pub mod message;
pub mod notification;
pub mod output;
pub mod recipient;
pub mod sales;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
