use clap::{Parser, Subcommand};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ObservabilitySnafu, Result},
    push::PushArgs,
    serve::ServeArgs,
};

mod error;
mod push;
mod remote;
mod serve;

#[derive(Parser)]
#[command(name = "roost")]
#[command(about = "Roost storage service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the storage gRPC server
    Serve {
        #[clap(flatten)]
        inner: ServeArgs,
    },
    /// Stream records from a JSON file to a storage server
    Push {
        #[clap(flatten)]
        inner: PushArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _observability =
        roost_observability::init_observability(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .context(ObservabilitySnafu {})?;

    let ct = CancellationToken::new();

    let ct_clone = ct.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ct_clone.cancel();
    });

    match cli.command {
        Commands::Serve { inner } => inner.run(ct).await,
        Commands::Push { inner } => inner.run(ct).await,
    }
}
