//! Document store boundary for the roost write path.
//!
//! The ingestion pipeline only needs a handful of operations from the
//! underlying store: declare a unique index, bulk insert, probe which
//! documents already exist and count the collection. They are captured by the
//! [`DocumentStore`] trait so the pipeline can run against MongoDB in
//! production and against [`InMemoryDocumentStore`] in tests and development.

pub mod document;
pub mod error;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;

pub use self::document::{Document, DocumentKey, FieldValue, UniqueIndex};
pub use self::error::{DocumentStoreError, Result};
pub use self::memory::InMemoryDocumentStore;
pub use self::mongo::{MongoConfig, MongoDocumentStore};

/// Operations the write path needs from a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Declares a unique index, doing nothing if it already exists.
    ///
    /// Fails with [`DocumentStoreError::IndexConflict`] if the index cannot be
    /// declared, for example because stored documents already violate it.
    async fn ensure_unique_index(&self, index: &UniqueIndex) -> Result<()>;

    /// Inserts the documents in order.
    ///
    /// The insert stops at the first document that violates a unique index
    /// and returns [`DocumentStoreError::DuplicateKey`]; the documents before
    /// it are persisted.
    async fn insert_many(&self, documents: &[Document]) -> Result<()>;

    /// Returns the keys of the stored documents whose `record_id` is in `record_ids`.
    async fn find_by_record_ids(&self, record_ids: &[i64]) -> Result<Vec<DocumentKey>>;

    /// Returns the number of documents in the collection.
    async fn count_documents(&self) -> Result<u64>;
}
