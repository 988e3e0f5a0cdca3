use futures::StreamExt;
use roost_ingestor_core::{IncomingRecord, IngestionPipeline, IngestorError};
use roost_protocol::{
    StorageService, StorageServiceServer, StoreRecordsRequest, StoreRecordsResponse,
};
use tonic::{Request, Response, Status, Streaming, async_trait};
use tracing::warn;

use crate::error::ingestor_error_to_status;

/// A tonic service that persists streamed records.
pub struct StorageServer {
    pipeline: IngestionPipeline,
}

impl StorageServer {
    pub fn new(pipeline: IngestionPipeline) -> Self {
        Self { pipeline }
    }

    pub fn into_tonic_server(self) -> StorageServiceServer<Self> {
        StorageServiceServer::new(self)
    }
}

#[async_trait]
impl StorageService for StorageServer {
    async fn store_records_stream(
        &self,
        request: Request<Streaming<StoreRecordsRequest>>,
    ) -> Result<Response<StoreRecordsResponse>, Status> {
        let records = request.into_inner().map(|item| match item {
            Ok(request) => incoming_record(request),
            Err(status) => Err(IngestorError::Stream {
                message: status.message().to_string(),
            }),
        });

        let stats = self.pipeline.ingest(records).await.map_err(|err| {
            warn!(error = %err, "record stream rejected");
            ingestor_error_to_status(err)
        })?;

        Ok(Response::new(StoreRecordsResponse {
            records_received: stats.received,
            records_stored: stats.stored,
        }))
    }
}

/// Extracts the record carried by a stream request.
pub fn incoming_record(request: StoreRecordsRequest) -> Result<IncomingRecord, IngestorError> {
    let Some(record) = request.record else {
        return Err(IngestorError::MalformedRecord {
            message: "request does not contain a record".to_string(),
        });
    };

    Ok(IncomingRecord {
        record_id: record.record_id,
        user_id: record.user_id,
        created_at: record.created_at,
        text: record.text,
        lang: record.lang,
    })
}
