use std::sync::Arc;

use futures::{Stream, stream};
use roost_document_store::InMemoryDocumentStore;
use roost_ingestor_core::{IncomingRecord, IngestionOptions, IngestionPipeline, Result};

pub fn create_pipeline(options: IngestionOptions) -> (IngestionPipeline, Arc<InMemoryDocumentStore>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let pipeline = IngestionPipeline::new(store.clone(), options).expect("valid options");

    (pipeline, store)
}

pub fn record(record_id: i64) -> IncomingRecord {
    IncomingRecord {
        record_id,
        user_id: 1_000 + record_id % 7,
        created_at: 1_562_774_400_000 + record_id,
        text: format!("record {record_id}"),
        lang: if record_id % 2 == 0 { "fr" } else { "en" }.to_string(),
    }
}

pub fn record_stream(
    ids: impl IntoIterator<Item = i64>,
) -> impl Stream<Item = Result<IncomingRecord>> + Send {
    let records: Vec<_> = ids.into_iter().map(|id| Ok(record(id))).collect();
    stream::iter(records)
}
