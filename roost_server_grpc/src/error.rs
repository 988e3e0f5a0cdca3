use std::net::SocketAddr;

use roost_ingestor_core::IngestorError;
use snafu::Snafu;
use tonic::Status;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ServerError {
    #[snafu(display("Failed to bind {address}"))]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
    #[snafu(display("Invalid ingestion options"))]
    Ingestion { source: IngestorError },
    #[snafu(display("Tonic reflection error"))]
    TonicReflection {
        source: tonic_reflection::server::Error,
    },
    #[snafu(display("Tonic server error"))]
    TonicServer { source: tonic::transport::Error },
    #[snafu(display("Server task failed"))]
    Join { source: tokio::task::JoinError },
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

pub fn ingestor_error_to_status(error: IngestorError) -> Status {
    match error {
        IngestorError::MalformedRecord { .. } | IngestorError::InvalidOptions { .. } => {
            Status::invalid_argument(error.to_string())
        }
        IngestorError::ConstraintDeclaration { ref source } => {
            Status::failed_precondition(format!("{error}: {source}"))
        }
        IngestorError::Stream { .. } => Status::aborted(error.to_string()),
        IngestorError::DocumentStore { ref source, .. } => {
            Status::unavailable(format!("{error}: {source}"))
        }
    }
}
