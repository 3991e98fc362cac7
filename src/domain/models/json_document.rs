//! Schemaless record used by the CLI and by callers without a typed model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::record::{Record, RecordKey, KEY_FIELD};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonDocumentError {
    #[error("document must be a JSON object")]
    NotAnObject,

    #[error("document has no usable `_id` (string or integer required)")]
    MissingKey,
}

/// A JSON object whose `_id` field is its identifying key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct JsonDocument {
    key: RecordKey,
    fields: Map<String, Value>,
}

impl JsonDocument {
    /// Build a document, generating a UUID `_id` when the object has none.
    pub fn with_generated_key(value: Value) -> Result<Self, JsonDocumentError> {
        let Value::Object(mut fields) = value else {
            return Err(JsonDocumentError::NotAnObject);
        };
        if !fields.contains_key(KEY_FIELD) {
            fields.insert(
                KEY_FIELD.to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        Self::try_from(Value::Object(fields))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Value> for JsonDocument {
    type Error = JsonDocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(fields) = value else {
            return Err(JsonDocumentError::NotAnObject);
        };
        let key = fields
            .get(KEY_FIELD)
            .and_then(RecordKey::from_json)
            .ok_or(JsonDocumentError::MissingKey)?;
        Ok(Self { key, fields })
    }
}

impl From<JsonDocument> for Value {
    fn from(doc: JsonDocument) -> Self {
        Self::Object(doc.fields)
    }
}

impl Record for JsonDocument {
    fn key(&self) -> RecordKey {
        self.key.clone()
    }
}
