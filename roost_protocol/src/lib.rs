//! Protocol definitions for the roost storage service.
//!
//! The generated types live under [`storage`]; the encoded file descriptor
//! set is exposed for the reflection service.

pub mod storage {
    tonic::include_proto!("roost.v1.storage");
}

pub use storage::{
    Record, StoreRecordsRequest, StoreRecordsResponse,
    storage_service_client::StorageServiceClient,
    storage_service_server::{StorageService, StorageServiceServer},
};

const STORAGE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("roost_v1_storage");

pub fn storage_file_descriptor_set() -> &'static [u8] {
    STORAGE_DESCRIPTOR_SET
}

impl StoreRecordsRequest {
    /// Wraps a record into a stream request.
    pub fn new(record: Record) -> Self {
        Self {
            record: Some(record),
        }
    }
}
