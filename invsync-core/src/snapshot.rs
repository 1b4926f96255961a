//! Snapshot assembler — whole inventories to documents and back.
//!
//! A snapshot document carries the identity fields `player` and `uuid` plus
//! one nested record per occupied slot under `<prefix><index>`:
//!
//! ```json
//! { "player": "Alice", "uuid": "1111…", "slot0": { "material": "DIAMOND_SWORD", … } }
//! ```
//!
//! An inventory with nothing in it is written as a fixed run of empty-material
//! placeholders, so the document is never just an identity.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::codec::{ItemCodec, Record};
use crate::config::SnapshotConfig;
use crate::error::Result;
use crate::store::{Document, Filter};
use crate::types::{Inventory, PlayerIdentity};

/// Document field holding the player name.
pub const PLAYER_FIELD: &str = "player";
/// Document field holding the player UUID.
pub const UUID_FIELD: &str = "uuid";

/// Records parsed out of a snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSnapshot {
    /// Slot index → record, for every well-formed slot field.
    pub slots: BTreeMap<usize, Record>,
    /// Slot-prefixed keys that could not be decoded.
    pub rejected: Vec<String>,
}

/// Builds and parses snapshot documents.
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    slot_prefix: String,
    empty_slots: usize,
}

impl Default for SnapshotAssembler {
    fn default() -> Self {
        Self::new(&SnapshotConfig::default())
    }
}

impl SnapshotAssembler {
    /// Create an assembler with the configured layout.
    #[must_use]
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            slot_prefix: config.slot_prefix.clone(),
            empty_slots: config.empty_slots,
        }
    }

    /// Document key for `slot`.
    #[must_use]
    pub fn slot_key(&self, slot: usize) -> String {
        format!("{}{slot}", self.slot_prefix)
    }

    /// Slot index encoded in `key`, if `key` is a well-formed slot key.
    ///
    /// `Ok(None)` means the key is not a slot field at all; `Err(())` means it
    /// carries the prefix but no valid index.
    fn parse_slot_key(&self, key: &str) -> std::result::Result<Option<usize>, ()> {
        let Some(digits) = key.strip_prefix(&self.slot_prefix) else {
            return Ok(None);
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        digits.parse().map(Some).map_err(|_| ())
    }

    /// Build the snapshot document for `inventory`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Serialization`](crate::SyncError::Serialization)
    /// if a record cannot be converted to a document value.
    pub fn encode<I>(&self, codec: &ItemCodec, identity: &PlayerIdentity, inventory: &I) -> Result<Document>
    where
        I: Inventory + ?Sized,
    {
        let mut doc = Document::new();
        doc.insert(PLAYER_FIELD.into(), Value::String(identity.name.clone()));
        doc.insert(UUID_FIELD.into(), Value::String(identity.uuid_text()));

        let mut occupied = 0usize;
        for slot in 0..inventory.size() {
            if let Some(item) = inventory.item(slot) {
                let record = codec.encode(item);
                doc.insert(self.slot_key(slot), serde_json::to_value(&record)?);
                occupied += 1;
            }
        }

        if occupied == 0 {
            let placeholder = serde_json::to_value(Record::bare(codec.catalog().empty_material()))?;
            for slot in 0..self.empty_slots {
                doc.insert(self.slot_key(slot), placeholder.clone());
            }
        }
        Ok(doc)
    }

    /// Parse every slot field of `doc` into a record.
    ///
    /// Non-slot fields are ignored. A slot-prefixed key without a valid index,
    /// or whose value is not a record, is logged and listed in
    /// [`DecodedSnapshot::rejected`]; the remaining slots still decode.
    #[must_use]
    pub fn decode(&self, doc: &Document) -> DecodedSnapshot {
        let mut decoded = DecodedSnapshot::default();
        for (key, value) in doc {
            let slot = match self.parse_slot_key(key) {
                Ok(Some(slot)) => slot,
                Ok(None) => continue,
                Err(()) => {
                    warn!(key = %key, "Rejecting malformed slot key");
                    decoded.rejected.push(key.clone());
                    continue;
                }
            };
            match Record::deserialize_value(value) {
                Ok(record) => {
                    decoded.slots.insert(slot, record);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Rejecting unreadable slot record");
                    decoded.rejected.push(key.clone());
                }
            }
        }
        decoded
    }

    /// Filter selecting a player's document by UUID only.
    #[must_use]
    pub fn uuid_filter(identity: &PlayerIdentity) -> Filter {
        Filter::new().with_field(UUID_FIELD, identity.uuid_text())
    }

    /// Filter selecting a player's document by name and UUID.
    #[must_use]
    pub fn identity_filter(identity: &PlayerIdentity) -> Filter {
        Filter::new()
            .with_field(PLAYER_FIELD, identity.name.clone())
            .with_field(UUID_FIELD, identity.uuid_text())
    }
}

impl Record {
    /// Deserialize a record from a nested document value.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if `value` is not a record object.
    pub fn deserialize_value(value: &Value) -> serde_json::Result<Self> {
        serde::Deserialize::deserialize(value)
    }
}
