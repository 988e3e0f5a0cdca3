use std::net::AddrParseError;

use roost_document_store::DocumentStoreError;
use roost_observability::ObservabilityError;
use roost_server_grpc::ServerError;
use snafu::Snafu;
use tonic::codegen::http::uri::InvalidUri;

/// CLI error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CliError {
    #[snafu(display("Invalid server address"))]
    InvalidServerUrl { source: AddrParseError },
    #[snafu(display("Invalid remote URL"))]
    InvalidRemoteUrl { source: InvalidUri },
    #[snafu(display("Connection error"))]
    Connection { source: tonic::transport::Error },
    #[snafu(display("Request failed"))]
    Request { source: tonic::Status },
    #[snafu(display("Failed to open document store"))]
    DocumentStore { source: DocumentStoreError },
    #[snafu(display("Document store unreachable after {attempts} attempts"))]
    StoreUnavailable {
        attempts: u32,
        source: DocumentStoreError,
    },
    #[snafu(display("Storage server error"))]
    Server { source: ServerError },
    #[snafu(display("Failed to initialize observability"))]
    Observability { source: ObservabilityError },
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },
    #[snafu(display("JSON parse error"))]
    JsonParse { source: serde_json::Error },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
