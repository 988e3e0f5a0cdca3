use std::sync::Arc;

use futures::{Stream, StreamExt};
use roost_document_store::{DocumentStore, UniqueIndex};
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    accumulator::BatchAccumulator,
    error::{ConstraintDeclarationSnafu, DocumentStoreSnafu, Result},
    metrics::IngestionMetrics,
    options::IngestionOptions,
    record::{IncomingRecord, transform_record},
    stats::IngestionStats,
    writer::BatchWriter,
};

/// Persists streams of records into a document store.
///
/// Each call to [`ingest`](Self::ingest) owns its own buffer; concurrent calls
/// only share the store.
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    options: IngestionOptions,
    index: UniqueIndex,
    metrics: Arc<IngestionMetrics>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, options: IngestionOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            store,
            options,
            index: UniqueIndex::record_identity(),
            metrics: Arc::new(IngestionMetrics::default()),
        })
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Declares the unique index over `(created_at, user_id, record_id)`.
    pub async fn ensure_constraint(&self) -> Result<()> {
        self.store
            .ensure_unique_index(&self.index)
            .await
            .context(ConstraintDeclarationSnafu {})
    }

    /// Consumes the stream, persisting every record at most once.
    ///
    /// A stream item error aborts the call and discards buffered documents.
    /// Batches that fail to persist are dropped and do not fail the call.
    pub async fn ingest<S>(&self, records: S) -> Result<IngestionStats>
    where
        S: Stream<Item = Result<IncomingRecord>> + Send,
    {
        self.ensure_constraint().await?;

        let count_before = self
            .store
            .count_documents()
            .await
            .context(DocumentStoreSnafu {
                message: "failed to count documents before ingestion",
            })?;

        let writer = BatchWriter::new(
            self.store.clone(),
            self.options.clone(),
            self.metrics.clone(),
        );
        let mut accumulator = BatchAccumulator::new(writer);
        let mut stats = IngestionStats::default();

        let mut records = std::pin::pin!(records);
        while let Some(record) = records.next().await {
            stats.record_received();
            self.metrics.records_received.add(1, &[]);

            let document = transform_record(record?)?;
            accumulator.offer(document).await;
        }

        accumulator.finalize().await;
        debug!(flushes = accumulator.flush_count(), "record stream drained");

        let count_after = self
            .store
            .count_documents()
            .await
            .context(DocumentStoreSnafu {
                message: "failed to count documents after ingestion",
            })?;

        stats.set_stored(count_before, count_after);

        info!(
            received = stats.received,
            stored = stats.stored,
            flushes = accumulator.flush_count(),
            "ingestion completed"
        );

        Ok(stats)
    }
}
