//! MongoDB implementation of the document store.

use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use tracing::{debug, info};

use crate::{
    DocumentStore,
    document::{Document, DocumentKey, UniqueIndex},
    error::{DocumentStoreError, Result},
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;
/// Server error codes for an index that clashes with an existing one.
const INDEX_OPTIONS_CONFLICT_CODE: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT_CODE: i32 = 86;

/// Connection settings for [`MongoDocumentStore`].
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string (e.g., "mongodb://localhost:27017")
    pub uri: String,
    /// Database name
    pub database: String,
    /// Collection holding the records
    pub collection: String,
    /// How long an operation waits for a suitable server
    pub server_selection_timeout: Duration,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "roost".to_string(),
            collection: "records".to_string(),
            server_selection_timeout: Duration::from_secs(5),
        }
    }
}

/// Document store backed by a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    client: Client,
    collection: Collection<bson::Document>,
}

impl MongoDocumentStore {
    /// Creates the client for the configured collection.
    ///
    /// The driver connects lazily, so this does not check that the server is
    /// reachable. Use [`DocumentStore::ping`] for that.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|err| DocumentStoreError::Connection {
                message: format!("invalid MongoDB URI: {err}"),
            })?;
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options).map_err(classify_error)?;
        let collection = client
            .database(&config.database)
            .collection::<bson::Document>(&config.collection);

        info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB document store initialized"
        );

        Ok(Self { client, collection })
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(classify_error)?;
        Ok(())
    }

    async fn ensure_unique_index(&self, index: &UniqueIndex) -> Result<()> {
        let keys = index
            .fields
            .iter()
            .map(|field| (field.clone(), Bson::Int32(1)))
            .collect::<bson::Document>();

        let model = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(index.name.clone())
                    .unique(true)
                    .build(),
            )
            .build();

        self.collection
            .create_index(model, None)
            .await
            .map_err(|err| classify_index_error(index, err))?;

        debug!(index = %index.name, "unique index declared");

        Ok(())
    }

    async fn insert_many(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let documents = documents.iter().map(document_to_bson);
        self.collection
            .insert_many(documents, None)
            .await
            .map_err(classify_error)?;

        Ok(())
    }

    async fn find_by_record_ids(&self, record_ids: &[i64]) -> Result<Vec<DocumentKey>> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = doc! { "record_id": { "$in": record_ids.to_vec() } };
        let options = FindOptions::builder()
            .projection(doc! { "_id": 0, "created_at": 1, "user_id": 1, "record_id": 1 })
            .build();

        let found: Vec<bson::Document> = self
            .collection
            .find(filter, options)
            .await
            .map_err(classify_error)?
            .try_collect()
            .await
            .map_err(classify_error)?;

        found.iter().map(key_from_bson).collect()
    }

    async fn count_documents(&self) -> Result<u64> {
        self.collection
            .estimated_document_count(None)
            .await
            .map_err(classify_error)
    }
}

/// Converts a document to its BSON representation, keeping field names as-is.
pub fn document_to_bson(document: &Document) -> bson::Document {
    doc! {
        "record_id": document.record_id,
        "user_id": document.user_id,
        "created_at": bson::DateTime::from_chrono(document.created_at),
        "text": document.text.as_str(),
        "lang": document.lang.as_str(),
    }
}

/// Extracts the identifying triple from a stored document.
pub fn key_from_bson(document: &bson::Document) -> Result<DocumentKey> {
    let created_at = document
        .get_datetime("created_at")
        .map_err(|err| DocumentStoreError::Serialization {
            message: format!("created_at: {err}"),
        })?
        .to_chrono();

    Ok(DocumentKey {
        created_at,
        user_id: get_integer(document, "user_id")?,
        record_id: get_integer(document, "record_id")?,
    })
}

/// Reads an integer field, accepting both 32 and 64 bit encodings.
fn get_integer(document: &bson::Document, field: &str) -> Result<i64> {
    match document.get(field) {
        Some(Bson::Int64(value)) => Ok(*value),
        Some(Bson::Int32(value)) => Ok(i64::from(*value)),
        Some(other) => Err(DocumentStoreError::Serialization {
            message: format!("{field}: expected an integer, found {:?}", other.element_type()),
        }),
        None => Err(DocumentStoreError::Serialization {
            message: format!("{field}: missing"),
        }),
    }
}

fn classify_index_error(index: &UniqueIndex, err: MongoError) -> DocumentStoreError {
    if let ErrorKind::Command(command) = err.kind.as_ref() {
        if matches!(
            command.code,
            DUPLICATE_KEY_CODE | INDEX_OPTIONS_CONFLICT_CODE | INDEX_KEY_SPECS_CONFLICT_CODE
        ) {
            return DocumentStoreError::IndexConflict {
                index: index.name.clone(),
                message: err.to_string(),
            };
        }
    }

    classify_error(err)
}

fn classify_error(err: MongoError) -> DocumentStoreError {
    let message = err.to_string();

    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => {
            let write_errors = failure.write_errors.as_deref().unwrap_or_default();
            let only_duplicates = !write_errors.is_empty()
                && write_errors.iter().all(|e| e.code == DUPLICATE_KEY_CODE)
                && failure.write_concern_error.is_none();

            if only_duplicates {
                // Ordered inserts stop at the first failure, so its index is
                // the number of documents that made it in.
                let inserted = write_errors.iter().map(|e| e.index).min().unwrap_or(0);
                DocumentStoreError::DuplicateKey { inserted, message }
            } else {
                DocumentStoreError::Internal { message }
            }
        }
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            DocumentStoreError::DuplicateKey {
                inserted: 0,
                message,
            }
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            DocumentStoreError::Serialization { message }
        }
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => DocumentStoreError::Connection { message },
        _ => DocumentStoreError::Internal { message },
    }
}
