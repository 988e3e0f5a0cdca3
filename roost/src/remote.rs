use clap::Args;
use snafu::ResultExt;
use tonic::transport::Channel;

use roost_protocol::StorageServiceClient;

use crate::error::{ConnectionSnafu, InvalidRemoteUrlSnafu, Result};

/// Arguments for configuring the remote server connection.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// The address of the remote storage server
    #[arg(long, default_value = "http://127.0.0.1:50052")]
    pub remote_address: String,
}

impl RemoteArgs {
    /// Create a new gRPC client for the storage service.
    pub async fn storage_client(&self) -> Result<StorageServiceClient<Channel>> {
        let channel = Channel::from_shared(self.remote_address.clone())
            .context(InvalidRemoteUrlSnafu {})?
            .connect()
            .await
            .context(ConnectionSnafu {})?;

        Ok(StorageServiceClient::new(channel))
    }
}
