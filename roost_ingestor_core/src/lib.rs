//! Batched, conflict-recovering write path.
//!
//! Records flow through [`transform_record`] into a [`BatchAccumulator`],
//! which hands full batches to a [`BatchWriter`]. The writer inserts each
//! batch in bulk and, when the store reports duplicate keys, asks the store
//! which documents already exist and retries the rest.
//! [`IngestionPipeline`] drives the whole sequence for one record stream.

pub mod accumulator;
pub mod error;
pub mod metrics;
pub mod options;
pub mod pipeline;
pub mod record;
pub mod stats;
pub mod writer;

#[cfg(test)]
pub mod test_utils;

pub use accumulator::BatchAccumulator;
pub use error::{IngestorError, Result};
pub use metrics::IngestionMetrics;
pub use options::{ConflictProbe, DEFAULT_FLUSH_THRESHOLD, IngestionOptions};
pub use pipeline::IngestionPipeline;
pub use record::{IncomingRecord, transform_record};
pub use stats::IngestionStats;
pub use writer::{BatchWriter, WriteOutcome};
