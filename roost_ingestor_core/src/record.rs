use chrono::{TimeZone, Utc};
use roost_document_store::Document;
use serde::{Deserialize, Serialize};

use crate::error::{IngestorError, Result};

/// A record as received from a client, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRecord {
    pub record_id: i64,
    pub user_id: i64,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    pub text: String,
    pub lang: String,
}

/// Converts an incoming record into the document stored for it.
///
/// The epoch timestamp becomes a UTC date time; all other fields are copied.
pub fn transform_record(record: IncomingRecord) -> Result<Document> {
    let Some(created_at) = Utc.timestamp_millis_opt(record.created_at).single() else {
        return Err(IngestorError::MalformedRecord {
            message: format!(
                "record {} has an out of range created_at timestamp: {}",
                record.record_id, record.created_at
            ),
        });
    };

    Ok(Document {
        record_id: record.record_id,
        user_id: record.user_id,
        created_at,
        text: record.text,
        lang: record.lang,
    })
}
