//! In-memory implementation of the document store.
//!
//! This implementation keeps the collection in memory and enforces declared
//! unique indexes the same way MongoDB does for ordered bulk inserts. It is
//! intended for testing and development.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    DocumentStore,
    document::{Document, DocumentKey, FieldValue, UniqueIndex},
    error::{DocumentStoreError, Result},
};

#[derive(Debug, Default)]
struct CollectionState {
    /// Documents in insertion order.
    documents: Vec<Document>,
    /// Map of index name to the index and its entries.
    indexes: HashMap<String, IndexState>,
}

#[derive(Debug)]
struct IndexState {
    index: UniqueIndex,
    entries: HashSet<Vec<FieldValue>>,
}

/// In-memory implementation of the document store.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<CollectionState>,
}

impl InMemoryDocumentStore {
    /// Create a new, empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the stored documents, in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.documents.clone()
    }

    /// Returns the names of the declared indexes.
    pub async fn index_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().await.indexes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl CollectionState {
    fn ensure_unique_index(&mut self, index: &UniqueIndex) -> Result<()> {
        if let Some(existing) = self.indexes.get(&index.name) {
            if existing.index.fields != index.fields {
                return Err(DocumentStoreError::IndexConflict {
                    index: index.name.clone(),
                    message: "an index with the same name but different keys already exists"
                        .to_string(),
                });
            }

            return Ok(());
        }

        let mut entries = HashSet::with_capacity(self.documents.len());
        for document in &self.documents {
            if !entries.insert(index.entry(document)) {
                return Err(DocumentStoreError::IndexConflict {
                    index: index.name.clone(),
                    message: format!(
                        "existing documents violate the index (duplicate record_id {})",
                        document.record_id
                    ),
                });
            }
        }

        self.indexes.insert(
            index.name.clone(),
            IndexState {
                index: index.clone(),
                entries,
            },
        );

        Ok(())
    }

    fn insert_one(&mut self, document: &Document) -> std::result::Result<(), String> {
        let mut pending = Vec::with_capacity(self.indexes.len());

        for (name, state) in &self.indexes {
            let entry = state.index.entry(document);
            if state.entries.contains(&entry) {
                return Err(format!(
                    "duplicate key on index {name} for record_id {}",
                    document.record_id
                ));
            }
            pending.push((name.clone(), entry));
        }

        for (name, entry) in pending {
            if let Some(state) = self.indexes.get_mut(&name) {
                state.entries.insert(entry);
            }
        }

        self.documents.push(document.clone());

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_unique_index(&self, index: &UniqueIndex) -> Result<()> {
        self.state.write().await.ensure_unique_index(index)
    }

    async fn insert_many(&self, documents: &[Document]) -> Result<()> {
        let mut state = self.state.write().await;

        for (inserted, document) in documents.iter().enumerate() {
            if let Err(message) = state.insert_one(document) {
                return Err(DocumentStoreError::DuplicateKey { inserted, message });
            }
        }

        Ok(())
    }

    async fn find_by_record_ids(&self, record_ids: &[i64]) -> Result<Vec<DocumentKey>> {
        let wanted: HashSet<i64> = record_ids.iter().copied().collect();
        let state = self.state.read().await;

        Ok(state
            .documents
            .iter()
            .filter(|document| wanted.contains(&document.record_id))
            .map(Document::key)
            .collect())
    }

    async fn count_documents(&self) -> Result<u64> {
        Ok(self.state.read().await.documents.len() as u64)
    }
}
