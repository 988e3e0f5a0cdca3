use roost_document_store::DocumentStoreError;
use snafu::Snafu;

/// Ingestor error types.
///
/// The message associated with an error is forwarded to the client,
/// for this reason it should contain information that is useful to the user.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestorError {
    /// A record could not be converted into a document.
    #[snafu(display("malformed record: {message}"))]
    MalformedRecord { message: String },
    /// The store rejected the uniqueness constraint.
    ///
    /// The collection cannot be used for ingestion until this is fixed.
    #[snafu(display("failed to declare uniqueness constraint"))]
    ConstraintDeclaration { source: DocumentStoreError },
    #[snafu(display("invalid ingestion options: {message}"))]
    InvalidOptions { message: String },
    /// The inbound record stream failed.
    #[snafu(display("record stream error: {message}"))]
    Stream { message: String },
    /// Document store error outside of the bulk write path.
    #[snafu(display("document store error: {message}"))]
    DocumentStore {
        message: &'static str,
        source: DocumentStoreError,
    },
}

pub type Result<T, E = IngestorError> = std::result::Result<T, E>;
