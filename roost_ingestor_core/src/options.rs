use std::collections::HashSet;

use roost_document_store::{Document, DocumentKey};

use crate::error::{IngestorError, Result};

pub const DEFAULT_FLUSH_THRESHOLD: usize = 256;

/// Configuration of one ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestionOptions {
    /// Number of buffered documents that triggers a flush.
    pub flush_threshold: usize,
    /// How documents reported by the existence probe are matched to the batch.
    pub conflict_probe: ConflictProbe,
}

/// Matching rule used to decide which documents of a conflicting batch are
/// already stored.
///
/// The store is always probed by `record_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictProbe {
    /// A document is present if any stored document has its `record_id`.
    #[default]
    RecordId,
    /// A document is present if a stored document has the same
    /// `(created_at, user_id, record_id)` triple.
    CompositeKey,
}

/// Set of stored documents found by the existence probe.
#[derive(Debug)]
pub(crate) enum ExistingDocuments {
    RecordIds(HashSet<i64>),
    Keys(HashSet<DocumentKey>),
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            conflict_probe: ConflictProbe::default(),
        }
    }
}

impl IngestionOptions {
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }

    pub fn with_conflict_probe(mut self, conflict_probe: ConflictProbe) -> Self {
        self.conflict_probe = conflict_probe;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(IngestorError::InvalidOptions {
                message: "flush threshold must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl ConflictProbe {
    pub(crate) fn existing(&self, keys: Vec<DocumentKey>) -> ExistingDocuments {
        match self {
            Self::RecordId => {
                ExistingDocuments::RecordIds(keys.into_iter().map(|key| key.record_id).collect())
            }
            Self::CompositeKey => ExistingDocuments::Keys(keys.into_iter().collect()),
        }
    }
}

impl ExistingDocuments {
    pub(crate) fn contains(&self, document: &Document) -> bool {
        match self {
            Self::RecordIds(ids) => ids.contains(&document.record_id),
            Self::Keys(keys) => keys.contains(&document.key()),
        }
    }
}
