use snafu::Snafu;

/// Errors returned by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum DocumentStoreError {
    /// A document violated a unique index.
    ///
    /// `inserted` is the number of documents persisted before the violation.
    #[snafu(display("duplicate key after {inserted} inserted documents: {message}"))]
    DuplicateKey { inserted: usize, message: String },
    #[snafu(display("cannot declare index {index}: {message}"))]
    IndexConflict { index: String, message: String },
    #[snafu(display("connection error: {message}"))]
    Connection { message: String },
    #[snafu(display("serialization error: {message}"))]
    Serialization { message: String },
    #[snafu(display("internal error: {message}"))]
    Internal { message: String },
}

pub type Result<T, E = DocumentStoreError> = ::std::result::Result<T, E>;

impl DocumentStoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
