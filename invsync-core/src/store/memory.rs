//! In-memory document store.

use parking_lot::RwLock;

use super::{Document, DocumentStore, Filter};
use crate::error::Result;

/// Documents kept in insertion order behind a read-write lock.
///
/// Uses the default, non-atomic [`DocumentStore::replace_one`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored document.
    #[must_use]
    pub fn all(&self) -> Vec<Document> {
        self.docs.read().clone()
    }

    /// Total number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.docs.read().iter().find(|d| filter.matches(d)).cloned())
    }

    fn insert(&self, doc: Document) -> Result<()> {
        self.docs.write().push(doc);
        Ok(())
    }

    fn delete_one(&self, filter: &Filter) -> Result<bool> {
        let mut docs = self.docs.write();
        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count(&self, filter: &Filter) -> Result<usize> {
        Ok(self.docs.read().iter().filter(|d| filter.matches(d)).count())
    }
}
