use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::{Args, ValueEnum};
use roost_document_store::{DocumentStore, InMemoryDocumentStore, MongoConfig, MongoDocumentStore};
use roost_ingestor_core::{ConflictProbe, DEFAULT_FLUSH_THRESHOLD, IngestionOptions};
use roost_server_grpc::{ServerOptions, start_server};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{CliError, DocumentStoreSnafu, InvalidServerUrlSnafu, Result, ServerSnafu};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// The address of the gRPC storage server.
    #[arg(long, env = "ROOST_STORAGE_GRPC_ADDRESS", default_value = "127.0.0.1:50052")]
    address: String,
    #[clap(flatten)]
    store: StoreArgs,
    /// Number of buffered records that triggers a bulk insert.
    #[arg(long, default_value_t = DEFAULT_FLUSH_THRESHOLD)]
    flush_threshold: usize,
    /// How documents found by the conflict probe are matched to a batch.
    #[arg(long, value_enum, default_value_t = ConflictProbeArg::RecordId)]
    conflict_probe: ConflictProbeArg,
    /// Number of connectivity checks before giving up on the document store.
    #[arg(long, default_value_t = 5)]
    connect_retries: u32,
    /// Seconds to wait between connectivity checks.
    #[arg(long, default_value_t = 2)]
    connect_backoff_secs: u64,
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// The document store backend.
    #[arg(long, value_enum, default_value_t = StoreKind::Mongodb)]
    store: StoreKind,
    /// The MongoDB connection string.
    #[arg(long, env = "ROOST_MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,
    #[arg(long, default_value = "roost")]
    mongodb_database: String,
    #[arg(long, default_value = "records")]
    mongodb_collection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Mongodb,
    /// Keep documents in memory. Data is lost on exit.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictProbeArg {
    RecordId,
    CompositeKey,
}

impl ServeArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let address = self
            .address
            .parse::<SocketAddr>()
            .context(InvalidServerUrlSnafu {})?;

        let store = self.store.open().await?;

        wait_for_store(
            store.as_ref(),
            self.connect_retries,
            Duration::from_secs(self.connect_backoff_secs),
            &ct,
        )
        .await?;

        let options = ServerOptions {
            address,
            ingestion: IngestionOptions::default()
                .with_flush_threshold(self.flush_threshold)
                .with_conflict_probe(self.conflict_probe.into()),
        };

        let server = match start_server(options, store).await {
            Ok(server) => server,
            Err(err) => {
                error!(%address, error = %err, "failed to start storage server");
                return Err(CliError::Server { source: err });
            }
        };

        ct.cancelled().await;
        info!("shutting down storage server");

        server.stop().await.context(ServerSnafu {})
    }
}

impl StoreArgs {
    async fn open(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.store {
            StoreKind::Memory => {
                warn!("using in-memory document store, data will not be persisted");
                Ok(Arc::new(InMemoryDocumentStore::new()))
            }
            StoreKind::Mongodb => {
                let config = MongoConfig {
                    uri: self.mongodb_uri.clone(),
                    database: self.mongodb_database.clone(),
                    collection: self.mongodb_collection.clone(),
                    ..Default::default()
                };

                let store = MongoDocumentStore::connect(&config)
                    .await
                    .context(DocumentStoreSnafu {})?;

                Ok(Arc::new(store))
            }
        }
    }
}

impl From<ConflictProbeArg> for ConflictProbe {
    fn from(value: ConflictProbeArg) -> Self {
        match value {
            ConflictProbeArg::RecordId => ConflictProbe::RecordId,
            ConflictProbeArg::CompositeKey => ConflictProbe::CompositeKey,
        }
    }
}

/// Pings the store until it answers, up to `retries` attempts.
async fn wait_for_store(
    store: &dyn DocumentStore,
    retries: u32,
    backoff: Duration,
    ct: &CancellationToken,
) -> Result<()> {
    let attempts = retries.max(1);

    for attempt in 1..=attempts {
        let err = match store.ping().await {
            Ok(()) => {
                info!(attempt, "document store is reachable");
                return Ok(());
            }
            Err(err) => err,
        };

        if attempt == attempts {
            error!(
                attempts,
                error = %err,
                "document store is unreachable, giving up"
            );
            return Err(CliError::StoreUnavailable {
                attempts,
                source: err,
            });
        }

        warn!(
            error = %err,
            "[Attempt {attempt}/{attempts}] document store is unreachable, retrying in {}s",
            backoff.as_secs()
        );

        tokio::select! {
            _ = ct.cancelled() => {
                return Err(CliError::StoreUnavailable { attempts: attempt, source: err });
            }
            _ = tokio::time::sleep(backoff) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use clap::Parser;
    use roost_document_store::{
        Document, DocumentKey, DocumentStoreError, Result as StoreResult, UniqueIndex,
    };

    use super::*;

    /// Store whose ping fails a fixed number of times.
    struct FlakyStore {
        failures: u32,
        pings: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                pings: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn ping(&self) -> StoreResult<()> {
            let ping = self.pings.fetch_add(1, Ordering::SeqCst);
            if ping < self.failures {
                return Err(DocumentStoreError::Connection {
                    message: "server selection timeout".to_string(),
                });
            }
            Ok(())
        }

        async fn ensure_unique_index(&self, _index: &UniqueIndex) -> StoreResult<()> {
            Ok(())
        }

        async fn insert_many(&self, _documents: &[Document]) -> StoreResult<()> {
            Ok(())
        }

        async fn find_by_record_ids(&self, _record_ids: &[i64]) -> StoreResult<Vec<DocumentKey>> {
            Ok(Vec::new())
        }

        async fn count_documents(&self) -> StoreResult<u64> {
            Ok(0)
        }
    }

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        serve: ServeArgs,
    }

    #[tokio::test]
    async fn test_wait_for_store_retries_until_reachable() {
        let store = FlakyStore::new(3);
        let ct = CancellationToken::new();

        wait_for_store(&store, 5, Duration::ZERO, &ct).await.unwrap();

        assert_eq!(store.pings.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_wait_for_store_gives_up() {
        let store = FlakyStore::new(u32::MAX);
        let ct = CancellationToken::new();

        let err = wait_for_store(&store, 5, Duration::ZERO, &ct)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::StoreUnavailable { attempts: 5, .. }));
        assert_eq!(store.pings.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_wait_for_store_stops_on_cancel() {
        let store = FlakyStore::new(u32::MAX);
        let ct = CancellationToken::new();
        ct.cancel();

        let err = wait_for_store(&store, 5, Duration::from_secs(60), &ct)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::StoreUnavailable { attempts: 1, .. }));
    }

    #[test]
    fn test_serve_defaults() {
        let cli = TestCli::parse_from(["roost"]);

        assert_eq!(cli.serve.address, "127.0.0.1:50052");
        assert_eq!(cli.serve.store.store, StoreKind::Mongodb);
        assert_eq!(cli.serve.flush_threshold, 256);
        assert_eq!(cli.serve.conflict_probe, ConflictProbeArg::RecordId);
        assert_eq!(cli.serve.connect_retries, 5);
        assert_eq!(cli.serve.connect_backoff_secs, 2);
    }

    #[test]
    fn test_serve_flags() {
        let cli = TestCli::parse_from([
            "roost",
            "--store",
            "memory",
            "--flush-threshold",
            "32",
            "--conflict-probe",
            "composite-key",
        ]);

        assert_eq!(cli.serve.store.store, StoreKind::Memory);
        assert_eq!(cli.serve.flush_threshold, 32);
        assert_eq!(
            ConflictProbe::from(cli.serve.conflict_probe),
            ConflictProbe::CompositeKey
        );
    }
}
