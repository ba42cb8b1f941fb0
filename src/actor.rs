//! Actor identity management.
//!
//! The actor is the uid of the user performing a mutation; it drives
//! message composition ("{actor} changed the status ...") and is never
//! excluded from the recipient set.
//!
//! Resolution order:
//! 1) CLI --actor (explicit)
//! 2) HERALD_ACTOR environment variable
//! 3) Persisted value in .herald/actor
//! 4) Config default (actor.default) or "unknown"

use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Resolve the current actor using CLI, environment, persisted value, and config.
pub fn resolve_actor(storage: &Storage, config: &Config, cli_actor: Option<&str>) -> String {
    if let Some(actor) = non_empty(cli_actor) {
        return actor.to_string();
    }

    if let Ok(env_actor) = std::env::var("HERALD_ACTOR") {
        if let Some(actor) = non_empty(Some(env_actor.as_str())) {
            return actor.to_string();
        }
    }

    if let Some(actor) = storage.read_actor() {
        return actor;
    }

    config.actor.default.clone()
}

/// Persist the actor uid in `.herald/actor`.
pub fn persist_actor(storage: &Storage, actor: &str) -> Result<()> {
    let actor = non_empty(Some(actor))
        .ok_or_else(|| Error::InvalidArgument("actor uid cannot be empty".to_string()))?;
    storage.write_actor(actor)
}

/// Load the persisted actor uid, if present.
pub fn load_persisted_actor(storage: &Storage) -> Option<String> {
    storage.read_actor()
}

/// Whether a data directory exists at the given base path.
pub fn data_dir_exists(base: &Path) -> bool {
    Storage::for_base_dir(base).is_initialized()
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::for_base_dir(dir.path());
        storage.init().expect("init");
        (dir, storage)
    }

    #[test]
    fn cli_actor_wins() {
        let (_dir, storage) = scratch();
        storage.write_actor("u-persisted").expect("persist");
        let config = Config::default();
        let actor = resolve_actor(&storage, &config, Some("u-cli"));
        assert_eq!(actor, "u-cli");
    }

    #[test]
    fn persisted_actor_beats_config_default() {
        let (_dir, storage) = scratch();
        storage.write_actor("u-persisted").expect("persist");
        let config = Config::default();
        // Env var may leak in from the harness; only assert when unset.
        if std::env::var("HERALD_ACTOR").is_err() {
            let actor = resolve_actor(&storage, &config, None);
            assert_eq!(actor, "u-persisted");
        }
    }

    #[test]
    fn falls_back_to_config_default() {
        let (_dir, storage) = scratch();
        let config = Config::default();
        if std::env::var("HERALD_ACTOR").is_err() {
            let actor = resolve_actor(&storage, &config, None);
            assert_eq!(actor, "unknown");
        }
    }

    #[test]
    fn empty_actor_is_rejected() {
        let (_dir, storage) = scratch();
        let err = persist_actor(&storage, "   ").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
