use std::sync::Arc;

use roost_document_store::{Document, DocumentStore, DocumentStoreError};
use tracing::{debug, error, warn};

use crate::{metrics::IngestionMetrics, options::IngestionOptions};

/// Bulk writer that recovers from duplicate key conflicts.
///
/// When the store rejects a batch because some of its documents are already
/// stored, the writer asks the store which ones exist, removes them from the
/// batch and inserts the rest. Every round must shrink the batch; a round that
/// does not is treated as a failure.
pub struct BatchWriter {
    store: Arc<dyn DocumentStore>,
    options: IngestionOptions,
    metrics: Arc<IngestionMetrics>,
}

/// How a batch left the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The batch was stored, after `conflicts` rounds of filtering.
    ///
    /// `inserted` counts the documents this writer inserted, across rounds.
    Stored { inserted: usize, conflicts: usize },
    /// Every remaining document was already stored.
    AlreadyPresent { inserted: usize, conflicts: usize },
    /// The store kept reporting conflicts for documents the probe could not
    /// find. The batch was dropped.
    ConflictStalled { remaining: usize },
    /// The store failed for a reason other than a conflict. The batch was dropped.
    Dropped { remaining: usize },
}

impl BatchWriter {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        options: IngestionOptions,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            store,
            options,
            metrics,
        }
    }

    pub fn flush_threshold(&self) -> usize {
        self.options.flush_threshold
    }

    /// Writes the batch if it is full or `force` is set.
    ///
    /// Returns the documents that still need to be written: the batch itself
    /// when the write is deferred, nothing otherwise. Failed batches are
    /// logged and dropped.
    pub async fn write(&self, batch: Vec<Document>, force: bool) -> Vec<Document> {
        if !force && batch.len() < self.options.flush_threshold {
            return batch;
        }

        if batch.is_empty() {
            return Vec::new();
        }

        self.write_batch(batch).await;

        Vec::new()
    }

    /// Inserts the batch, filtering out stored documents on conflicts.
    pub async fn write_batch(&self, batch: Vec<Document>) -> WriteOutcome {
        self.metrics.batches_flushed.add(1, &[]);

        let mut pending = batch;
        let mut inserted = 0;
        let mut conflicts = 0;

        loop {
            let err = match self.store.insert_many(&pending).await {
                Ok(()) => {
                    inserted += pending.len();
                    self.metrics.documents_stored.add(pending.len() as u64, &[]);
                    debug!(batch_size = pending.len(), inserted, conflicts, "batch stored");

                    return WriteOutcome::Stored {
                        inserted,
                        conflicts,
                    };
                }
                Err(err) => err,
            };

            let DocumentStoreError::DuplicateKey {
                inserted: partial, ..
            } = &err
            else {
                error!(
                    batch_size = pending.len(),
                    error = ?err,
                    "unexpected error during bulk insert, dropping batch"
                );
                self.metrics.batches_dropped.add(1, &[]);

                return WriteOutcome::Dropped {
                    remaining: pending.len(),
                };
            };

            inserted += partial;
            self.metrics.documents_stored.add(*partial as u64, &[]);
            warn!(
                batch_size = pending.len(),
                inserted = partial,
                error = %err,
                "duplicate key conflict during bulk insert"
            );

            let mut record_ids: Vec<i64> = pending.iter().map(|doc| doc.record_id).collect();
            record_ids.sort_unstable();
            record_ids.dedup();

            let found = match self.store.find_by_record_ids(&record_ids).await {
                Ok(found) => found,
                Err(err) => {
                    error!(
                        batch_size = pending.len(),
                        error = ?err,
                        "failed to look up existing documents, dropping batch"
                    );
                    self.metrics.batches_dropped.add(1, &[]);

                    return WriteOutcome::Dropped {
                        remaining: pending.len(),
                    };
                }
            };

            let existing = self.options.conflict_probe.existing(found);
            let before = pending.len();
            pending.retain(|doc| !existing.contains(doc));
            conflicts += 1;

            if pending.is_empty() {
                warn!(batch_size = before, "all documents already stored, skipping batch");

                return WriteOutcome::AlreadyPresent {
                    inserted,
                    conflicts,
                };
            }

            if pending.len() == before {
                error!(
                    batch_size = before,
                    conflicts,
                    "duplicate key conflict persists but no stored document matches, dropping batch"
                );
                self.metrics.batches_dropped.add(1, &[]);

                return WriteOutcome::ConflictStalled { remaining: before };
            }

            self.metrics.conflicts_recovered.add(1, &[]);
            debug!(
                removed = before - pending.len(),
                remaining = pending.len(),
                "retrying bulk insert without stored documents"
            );
        }
    }
}
