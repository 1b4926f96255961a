//! Configuration for inventory sync, loadable from TOML.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [store]
//! backend = "sqlite"
//! path = "inventories.db"
//!
//! [snapshot]
//! slot_prefix = "slot"
//! empty_slots = 36
//!
//! [session]
//! first_join_save = true
//! sentinel_tag = "inventory_synced"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Snapshot document layout.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Session sync policy.
    #[serde(default)]
    pub session: SessionConfig,
}

impl SyncConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    /// Returns `SyncError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.snapshot.slot_prefix;
        if prefix.is_empty() {
            return Err(SyncError::Config("snapshot.slot_prefix must not be empty".into()));
        }
        if prefix.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(SyncError::Config(format!(
                "snapshot.slot_prefix must not end in a digit: {prefix:?}"
            )));
        }
        if self.snapshot.empty_slots == 0 {
            return Err(SyncError::Config("snapshot.empty_slots must be at least 1".into()));
        }
        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(SyncError::Config(format!(
                "store.backend must be \"sqlite\" or \"memory\", got {:?}",
                self.store.backend
            )));
        }
        if !crate::store::sqlite::is_identifier(&self.store.collection) {
            return Err(SyncError::Config(format!(
                "store.collection must be a plain identifier, got {:?}",
                self.store.collection
            )));
        }
        if self.session.sentinel_tag.is_empty() {
            return Err(SyncError::Config("session.sentinel_tag must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether sync is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: default_log_level(),
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite" or "memory".
    #[serde(default = "default_sqlite")]
    pub backend: String,
    /// Database file for the sqlite backend.
    #[serde(default = "default_path")]
    pub path: String,
    /// Collection (table) holding inventory documents.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_sqlite(),
            path: default_path(),
            collection: default_collection(),
            wal_mode: true,
            checksum_enabled: true,
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// Snapshot document layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Prefix of per-slot document fields (`slot0`, `slot1`, ...).
    #[serde(default = "default_slot_prefix")]
    pub slot_prefix: String,
    /// Slots written as empty placeholders when the inventory holds nothing.
    #[serde(default = "default_empty_slots")]
    pub empty_slots: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            slot_prefix: default_slot_prefix(),
            empty_slots: default_empty_slots(),
        }
    }
}

/// Session sync policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Run the stamp-and-save pass after the first join of the process.
    #[serde(default = "default_true")]
    pub first_join_save: bool,
    /// Tag stamped on every item during the first-join pass.
    #[serde(default = "default_sentinel_tag")]
    pub sentinel_tag: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_join_save: true,
            sentinel_tag: default_sentinel_tag(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_sqlite() -> String { "sqlite".to_string() }
fn default_path() -> String { "inventories.db".to_string() }
fn default_collection() -> String { "inventories".to_string() }
fn default_busy_timeout() -> u64 { 5000 }
fn default_slot_prefix() -> String { "slot".to_string() }
fn default_empty_slots() -> usize { crate::types::MAIN_INVENTORY_SLOTS }
fn default_sentinel_tag() -> String { "inventory_synced".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SyncConfig::default();
        config.validate().expect("valid");
        assert_eq!(config.snapshot.slot_prefix, "slot");
        assert_eq!(config.snapshot.empty_slots, 36);
        assert_eq!(config.store.collection, "inventories");
        assert!(config.session.first_join_save);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = SyncConfig::from_toml(
            r#"
            [store]
            backend = "memory"

            [session]
            sentinel_tag = "synced_once"
            "#,
        )
        .expect("parse");
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.path, "inventories.db");
        assert_eq!(config.session.sentinel_tag, "synced_once");
        assert!(config.session.first_join_save);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn invalid_values_rejected() {
        for toml in [
            "[snapshot]\nslot_prefix = \"\"",
            "[snapshot]\nslot_prefix = \"s1\"",
            "[snapshot]\nempty_slots = 0",
            "[store]\nbackend = \"mongo\"",
            "[store]\ncollection = \"a b\"",
            "[session]\nsentinel_tag = \"\"",
            "not toml at all [",
        ] {
            assert!(
                matches!(SyncConfig::from_toml(toml), Err(SyncError::Config(_))),
                "should reject: {toml}"
            );
        }
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("invsync.toml");
        std::fs::write(&path, "[snapshot]\nempty_slots = 41\n").expect("write");
        let config = SyncConfig::from_file(&path).expect("load");
        assert_eq!(config.snapshot.empty_slots, 41);
    }
}
