//! Document stores.
//!
//! A store holds schema-less [`Document`]s and answers field-equality
//! [`Filter`]s. Two backends ship with the crate:
//!
//! - [`MemoryStore`] — a vector behind a lock, for tests and dry runs.
//! - [`SqliteStore`] — one JSON document per row, queried with
//!   `json_extract`.
//!
//! [`DocumentStore::replace_one`] has a default delete-then-insert body,
//! which is not atomic. Backends that can do better override it.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{Result, SyncError};

/// A schema-less document: string keys to JSON values.
pub type Document = serde_json::Map<String, Value>;

/// A conjunction of top-level field equalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: require `field == value`.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// The `(field, value)` pairs, in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Whether `doc` satisfies every equality.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// What [`DocumentStore::replace_one`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document matched; the new one was inserted.
    Inserted,
    /// A matching document was replaced.
    Replaced,
}

/// A key-value document store.
pub trait DocumentStore: Send + Sync {
    /// First document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the backend fails.
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a document.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the backend fails.
    fn insert(&self, doc: Document) -> Result<()>;

    /// Delete the first document matching `filter`. Returns whether one was deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the backend fails.
    fn delete_one(&self, filter: &Filter) -> Result<bool>;

    /// Number of documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the backend fails.
    fn count(&self, filter: &Filter) -> Result<usize>;

    /// Replace the first document matching `filter`, or insert if none does.
    ///
    /// The default body is find, delete, insert as three separate calls:
    /// a concurrent writer can interleave, and a reader can briefly see no
    /// document at all. Callers serialise per key; backends with
    /// transactions override this.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if any step fails.
    fn replace_one(&self, filter: &Filter, doc: Document) -> Result<UpsertOutcome> {
        if self.find_one(filter)?.is_some() {
            self.delete_one(filter)?;
            self.insert(doc)?;
            Ok(UpsertOutcome::Replaced)
        } else {
            self.insert(doc)?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

/// Open the backend named by `config.backend`.
///
/// # Errors
///
/// Returns [`SyncError::Config`] for an unknown backend, or the backend's
/// own error if it cannot be opened.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend.as_str() {
        "sqlite" => Ok(Arc::new(SqliteStore::open(&config.path, config)?)),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(SyncError::Config(format!("unknown store backend: {other}"))),
    }
}
