use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use roost_document_store::{
    Document, DocumentKey, DocumentStore, DocumentStoreError, InMemoryDocumentStore,
    Result as StoreResult, UniqueIndex,
};

use crate::{IngestionMetrics, IngestionOptions, record::IncomingRecord, writer::BatchWriter};

/// Generate an incoming record whose fields are derived from `record_id`.
pub fn test_record(record_id: i64) -> IncomingRecord {
    IncomingRecord {
        record_id,
        user_id: record_id % 17,
        created_at: 1_556_000_000_000 + record_id * 1_000,
        text: format!("record number {record_id}"),
        lang: "en".to_string(),
    }
}

/// Generate the document stored for [`test_record`].
pub fn test_document(record_id: i64) -> Document {
    Document {
        record_id,
        user_id: record_id % 17,
        created_at: Utc
            .timestamp_millis_opt(1_556_000_000_000 + record_id * 1_000)
            .unwrap(),
        text: format!("record number {record_id}"),
        lang: "en".to_string(),
    }
}

pub fn test_documents(ids: impl IntoIterator<Item = i64>) -> Vec<Document> {
    ids.into_iter().map(test_document).collect()
}

/// Document store that wraps an in-memory store, records calls and injects faults.
#[derive(Default)]
pub struct TestDocumentStore {
    inner: InMemoryDocumentStore,
    insert_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    insert_faults: Mutex<VecDeque<DocumentStoreError>>,
    probe_fault: Mutex<Option<DocumentStoreError>>,
    blind_probe: AtomicBool,
    reject_index: AtomicBool,
}

impl TestDocumentStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a store that already holds the given documents under the
    /// record identity index.
    pub async fn with_documents(documents: &[Document]) -> Arc<Self> {
        let store = Self::new();
        store
            .inner
            .ensure_unique_index(&UniqueIndex::record_identity())
            .await
            .unwrap();
        store.inner.insert_many(documents).await.unwrap();
        store
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Makes the next insert fail with `error` without touching the data.
    pub fn fail_next_insert(&self, error: DocumentStoreError) {
        self.insert_faults.lock().unwrap().push_back(error);
    }

    /// Makes the next existence probe fail with `error`.
    pub fn fail_next_probe(&self, error: DocumentStoreError) {
        *self.probe_fault.lock().unwrap() = Some(error);
    }

    /// Makes the existence probe report no documents.
    pub fn set_blind_probe(&self, blind: bool) {
        self.blind_probe.store(blind, Ordering::SeqCst);
    }

    pub fn set_reject_index(&self, reject: bool) {
        self.reject_index.store(reject, Ordering::SeqCst);
    }

    pub async fn stored_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .inner
            .documents()
            .await
            .iter()
            .map(|document| document.record_id)
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl DocumentStore for TestDocumentStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn ensure_unique_index(&self, index: &UniqueIndex) -> StoreResult<()> {
        if self.reject_index.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::IndexConflict {
                index: index.name.clone(),
                message: "rejected by test store".to_string(),
            });
        }

        self.inner.ensure_unique_index(index).await
    }

    async fn insert_many(&self, documents: &[Document]) -> StoreResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        let fault = self.insert_faults.lock().unwrap().pop_front();
        if let Some(error) = fault {
            return Err(error);
        }

        self.inner.insert_many(documents).await
    }

    async fn find_by_record_ids(&self, record_ids: &[i64]) -> StoreResult<Vec<DocumentKey>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);

        let fault = self.probe_fault.lock().unwrap().take();
        if let Some(error) = fault {
            return Err(error);
        }

        if self.blind_probe.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        self.inner.find_by_record_ids(record_ids).await
    }

    async fn count_documents(&self) -> StoreResult<u64> {
        self.inner.count_documents().await
    }
}

pub fn test_writer(store: Arc<TestDocumentStore>, options: IngestionOptions) -> BatchWriter {
    BatchWriter::new(store, options, Arc::new(IngestionMetrics::default()))
}

pub fn connection_error() -> DocumentStoreError {
    DocumentStoreError::Connection {
        message: "connection reset by peer".to_string(),
    }
}
