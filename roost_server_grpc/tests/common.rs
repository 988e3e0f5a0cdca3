use std::sync::Arc;

use roost_document_store::InMemoryDocumentStore;
use roost_ingestor_core::IngestionOptions;
use roost_protocol::{Record, StorageServiceClient, StoreRecordsRequest};
use roost_server_grpc::{ServerHandle, ServerOptions, start_server};
use tonic::transport::Channel;

pub async fn create_storage_server(
    ingestion: IngestionOptions,
) -> (
    ServerHandle,
    StorageServiceClient<Channel>,
    Arc<InMemoryDocumentStore>,
) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let options = ServerOptions {
        address: "127.0.0.1:0".parse().expect("valid address"),
        ingestion,
    };

    let handle = start_server(options, store.clone())
        .await
        .expect("start server");

    let client = StorageServiceClient::connect(format!("http://{}", handle.local_addr()))
        .await
        .expect("connect client");

    (handle, client, store)
}

pub fn record(record_id: i64) -> Record {
    Record {
        record_id,
        user_id: 500 + record_id % 11,
        created_at: 1_556_012_345_000 + record_id * 60_000,
        text: format!("message {record_id}"),
        lang: "en".to_string(),
    }
}

pub fn requests(ids: impl IntoIterator<Item = i64>) -> Vec<StoreRecordsRequest> {
    ids.into_iter()
        .map(|id| StoreRecordsRequest::new(record(id)))
        .collect()
}
