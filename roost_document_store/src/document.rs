use chrono::{DateTime, Utc};

/// A record as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub record_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub lang: String,
}

/// The `(created_at, user_id, record_id)` triple that identifies a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub record_id: i64,
}

/// The value of a single document field, as seen by an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Integer(i64),
    DateTime(DateTime<Utc>),
    String(String),
    /// Missing fields are indexed as null.
    Null,
}

/// A unique index declared over one or more document fields, all ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub name: String,
    pub fields: Vec<String>,
}

impl Document {
    pub fn key(&self) -> DocumentKey {
        DocumentKey {
            created_at: self.created_at,
            user_id: self.user_id,
            record_id: self.record_id,
        }
    }

    /// Returns the value of the named field.
    pub fn field(&self, name: &str) -> FieldValue {
        match name {
            "record_id" => FieldValue::Integer(self.record_id),
            "user_id" => FieldValue::Integer(self.user_id),
            "created_at" => FieldValue::DateTime(self.created_at),
            "text" => FieldValue::String(self.text.clone()),
            "lang" => FieldValue::String(self.lang.clone()),
            _ => FieldValue::Null,
        }
    }
}

impl UniqueIndex {
    pub const CREATED_AT: &'static str = "created_at";
    pub const USER_ID: &'static str = "user_id";
    pub const RECORD_ID: &'static str = "record_id";

    /// Creates a unique index over the given fields, named after them the way
    /// MongoDB names compound indexes (`field_1_other_1`).
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let name = fields
            .iter()
            .map(|field| format!("{field}_1"))
            .collect::<Vec<_>>()
            .join("_");

        Self { name, fields }
    }

    /// The composite index that guarantees a record is stored at most once.
    pub fn record_identity() -> Self {
        Self::new([Self::CREATED_AT, Self::USER_ID, Self::RECORD_ID])
    }

    /// Returns the index entry for the given document.
    pub fn entry(&self, document: &Document) -> Vec<FieldValue> {
        self.fields
            .iter()
            .map(|field| document.field(field))
            .collect()
    }
}
