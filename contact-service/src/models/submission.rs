use chrono::{DateTime, Utc};
use mongodb::bson::{self, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::Serialize;

/// One contact-form entry as stored: `{ name, email, message, createdAt }`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Stamp a new submission with the current server time, at the
    /// millisecond precision BSON dates keep.
    pub fn new(name: String, email: String, message: String) -> Self {
        Self {
            name,
            email,
            message,
            created_at: bson::DateTime::now().to_chrono(),
        }
    }

    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(self)
    }
}
