use common::{create_pipeline, record, record_stream};
use roost_document_store::DocumentStore;
use roost_ingestor_core::{ConflictProbe, IngestionOptions, IngestionStats, Result};

mod common;

#[tokio::test]
async fn test_ingestion_is_idempotent() -> Result<()> {
    let (pipeline, store) = create_pipeline(IngestionOptions::default());

    let first = pipeline.ingest(record_stream(0..600)).await?;
    assert_eq!(
        first,
        IngestionStats {
            received: 600,
            stored: 600
        }
    );

    let second = pipeline.ingest(record_stream(0..600)).await?;
    assert_eq!(
        second,
        IngestionStats {
            received: 600,
            stored: 0
        }
    );

    assert_eq!(store.count_documents().await.unwrap(), 600);

    Ok(())
}

#[tokio::test]
async fn test_stats_across_flush_boundaries() -> Result<()> {
    for (count, flush_threshold) in [(1, 1), (10, 3), (99, 10), (100, 10), (101, 10), (257, 256)] {
        let options = IngestionOptions::default().with_flush_threshold(flush_threshold);
        let (pipeline, _store) = create_pipeline(options);

        let stats = pipeline.ingest(record_stream(0..count)).await?;

        assert_eq!(stats.received, count as u64, "threshold {flush_threshold}");
        assert_eq!(stats.stored, count, "threshold {flush_threshold}");
    }

    Ok(())
}

#[tokio::test]
async fn test_empty_stream() -> Result<()> {
    let (pipeline, store) = create_pipeline(IngestionOptions::default());

    let stats = pipeline.ingest(record_stream(0..0)).await?;

    assert_eq!(stats, IngestionStats::default());
    assert_eq!(store.count_documents().await.unwrap(), 0);
    assert_eq!(
        store.index_names().await,
        vec!["created_at_1_user_id_1_record_id_1".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_overlapping_calls_store_each_record_once() -> Result<()> {
    let options = IngestionOptions::default().with_flush_threshold(32);
    let (pipeline, store) = create_pipeline(options);

    pipeline.ingest(record_stream(0..100)).await?;
    let stats = pipeline.ingest(record_stream(50..200)).await?;

    assert_eq!(stats.received, 150);
    assert_eq!(stats.stored, 100);

    let mut ids: Vec<i64> = store.documents().await.iter().map(|d| d.record_id).collect();
    ids.sort();
    assert_eq!(ids, (0..200).collect::<Vec<_>>());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_calls_store_each_record_once() -> Result<()> {
    let options = IngestionOptions::default().with_flush_threshold(16);
    let (pipeline, store) = create_pipeline(options);

    let (left, right) = tokio::join!(
        pipeline.ingest(record_stream(0..300)),
        pipeline.ingest(record_stream((150..450).rev())),
    );
    left?;
    right?;

    assert_eq!(store.count_documents().await.unwrap(), 450);

    Ok(())
}

#[tokio::test]
async fn test_composite_probe_stores_each_record_once() -> Result<()> {
    let options = IngestionOptions::default()
        .with_flush_threshold(8)
        .with_conflict_probe(ConflictProbe::CompositeKey);
    let (pipeline, store) = create_pipeline(options);

    pipeline.ingest(record_stream([1, 3, 5])).await?;
    let stats = pipeline.ingest(record_stream(0..8)).await?;

    assert_eq!(stats.stored, 5);
    assert_eq!(store.count_documents().await.unwrap(), 8);

    Ok(())
}

#[tokio::test]
async fn test_stored_documents_keep_record_fields() -> Result<()> {
    let (pipeline, store) = create_pipeline(IngestionOptions::default());

    pipeline.ingest(record_stream([42])).await?;

    let documents = store.documents().await;
    let expected = record(42);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].record_id, expected.record_id);
    assert_eq!(documents[0].user_id, expected.user_id);
    assert_eq!(documents[0].created_at.timestamp_millis(), expected.created_at);
    assert_eq!(documents[0].text, expected.text);
    assert_eq!(documents[0].lang, expected.lang);

    Ok(())
}
