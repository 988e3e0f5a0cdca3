use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use roost_document_store::DocumentStore;
use roost_ingestor_core::{IngestionOptions, IngestionPipeline};
use snafu::ResultExt;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    error::{BindSnafu, IngestionSnafu, JoinSnafu, Result, TonicReflectionSnafu, TonicServerSnafu},
    service::StorageServer,
};

pub const DEFAULT_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50052);

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address the gRPC server listens on. Port 0 picks a free port.
    pub address: SocketAddr,
    pub ingestion: IngestionOptions,
}

/// A running storage server.
///
/// Dropping the handle leaves the server running; call [`stop`](Self::stop)
/// to shut it down.
pub struct ServerHandle {
    local_addr: SocketAddr,
    ct: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            ingestion: IngestionOptions::default(),
        }
    }
}

/// Binds the listener and starts serving the storage service in the background.
pub async fn start_server(
    options: ServerOptions,
    store: Arc<dyn DocumentStore>,
) -> Result<ServerHandle> {
    let pipeline = IngestionPipeline::new(store, options.ingestion).context(IngestionSnafu {})?;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(roost_protocol::storage_file_descriptor_set())
        .build_v1()
        .context(TonicReflectionSnafu {})?;

    let storage_service = StorageServer::new(pipeline).into_tonic_server();

    let listener = TcpListener::bind(options.address)
        .await
        .context(BindSnafu {
            address: options.address,
        })?;
    let local_addr = listener.local_addr().context(BindSnafu {
        address: options.address,
    })?;

    let ct = CancellationToken::new();
    let task = tokio::spawn({
        let ct = ct.clone();
        async move {
            tonic::transport::Server::builder()
                .add_service(reflection_service)
                .add_service(storage_service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    ct.cancelled().await;
                })
                .await
                .context(TonicServerSnafu {})
        }
    });

    info!(address = %local_addr, "storage server listening");

    Ok(ServerHandle {
        local_addr,
        ct,
        task,
    })
}

impl ServerHandle {
    /// The address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting requests and waits for the server to shut down.
    pub async fn stop(self) -> Result<()> {
        self.ct.cancel();
        self.task.await.context(JoinSnafu {})??;

        info!(address = %self.local_addr, "storage server stopped");

        Ok(())
    }
}
