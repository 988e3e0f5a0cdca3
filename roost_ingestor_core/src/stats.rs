/// Counters reported at the end of an ingestion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of records read from the stream.
    pub received: u64,
    /// Growth of the collection during the call.
    ///
    /// This is a size delta: other writers can make it differ from the number
    /// of documents this call inserted, and even make it negative.
    pub stored: i64,
}

impl IngestionStats {
    pub fn record_received(&mut self) {
        self.received += 1;
    }

    /// Sets `stored` from the collection size before and after the call.
    pub fn set_stored(&mut self, count_before: u64, count_after: u64) {
        self.stored = size_delta(count_before, count_after);
    }
}

/// Returns `after - before` as a signed value.
pub fn size_delta(before: u64, after: u64) -> i64 {
    let delta = i128::from(after) - i128::from(before);
    delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
