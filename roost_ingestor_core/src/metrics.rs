use roost_observability::Counter;

pub struct IngestionMetrics {
    pub records_received: Counter<u64>,
    pub documents_stored: Counter<u64>,
    pub batches_flushed: Counter<u64>,
    pub conflicts_recovered: Counter<u64>,
    pub batches_dropped: Counter<u64>,
}

impl Default for IngestionMetrics {
    fn default() -> Self {
        let meter = roost_observability::meter("ingestion");
        Self {
            records_received: meter
                .u64_counter("storage.ingest.records_received")
                .with_unit("{record}")
                .with_description("number of records received by ingestion calls")
                .build(),
            documents_stored: meter
                .u64_counter("storage.ingest.documents_stored")
                .with_unit("{document}")
                .with_description("number of documents inserted by the bulk writer")
                .build(),
            batches_flushed: meter
                .u64_counter("storage.ingest.batches_flushed")
                .with_unit("{batch}")
                .with_description("number of batches handed to the bulk writer")
                .build(),
            conflicts_recovered: meter
                .u64_counter("storage.ingest.conflicts_recovered")
                .with_unit("{conflict}")
                .with_description("number of duplicate key conflicts resolved by filtering")
                .build(),
            batches_dropped: meter
                .u64_counter("storage.ingest.batches_dropped")
                .with_unit("{batch}")
                .with_description("number of batches dropped after a failed bulk write")
                .build(),
        }
    }
}
