//! gRPC front end of the storage service.

mod error;
mod handle;
mod service;

pub use error::{Result, ServerError, ingestor_error_to_status};
pub use handle::{DEFAULT_ADDRESS, ServerHandle, ServerOptions, start_server};
pub use service::{StorageServer, incoming_record};
