//! Record abstraction: the caller-defined document type and its key.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name that carries the identifying key in stored documents.
pub const KEY_FIELD: &str = "_id";

/// Identifying key of a record.
///
/// Stored as `_id` by the NoSQL driver and in the `id` column by the SQL
/// driver. Two records with the same key collide on insert.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Parse a key out of a JSON `_id` value. Strings and integers are accepted.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A value the repository can persist.
///
/// Only the identifying key is required; the rest of the shape is opaque to
/// the repository and travels through serde.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    fn key(&self) -> RecordKey;
}

/// A serialized record as handed to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: RecordKey,
    pub body: Value,
}

impl StoredDocument {
    pub fn from_record<T: Record>(record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            key: record.key(),
            body: serde_json::to_value(record)?,
        })
    }

    /// The `_id` value as persisted. The record's own `_id` keeps its JSON
    /// type when it agrees with the key; otherwise the key is stored as a
    /// string.
    pub fn key_value(&self) -> Value {
        self.body
            .get(KEY_FIELD)
            .filter(|id| RecordKey::from_json(id).as_ref() == Some(&self.key))
            .cloned()
            .unwrap_or_else(|| Value::String(self.key.as_str().to_string()))
    }

    /// Body as persisted: always an object carrying [`Self::key_value`] as
    /// `_id`. A non-object body is wrapped under `value`.
    pub fn persisted_body(&self) -> Value {
        let mut map = match &self.body {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        };
        map.insert(KEY_FIELD.to_string(), self.key_value());
        Value::Object(map)
    }

    /// Body without the `_id` field, for drivers that keep the key elsewhere
    /// or forbid rewriting it.
    pub fn body_without_key(&self) -> Value {
        match &self.body {
            Value::Object(map) => {
                let mut map = map.clone();
                map.remove(KEY_FIELD);
                Value::Object(map)
            }
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Product {
        #[serde(rename = "_id")]
        id: String,
        name: String,
    }

    impl Record for Product {
        fn key(&self) -> RecordKey {
            RecordKey::new(&self.id)
        }
    }

    #[test]
    fn test_stored_document_from_record() {
        let product = Product {
            id: "1".to_string(),
            name: "sss".to_string(),
        };
        let doc = StoredDocument::from_record(&product).unwrap();
        assert_eq!(doc.key.as_str(), "1");
        assert_eq!(doc.body, json!({"_id": "1", "name": "sss"}));
        assert_eq!(doc.body_without_key(), json!({"name": "sss"}));
    }

    #[test]
    fn test_persisted_body_keeps_integer_id() {
        let doc = StoredDocument {
            key: RecordKey::new("42"),
            body: json!({"_id": 42, "name": "a"}),
        };
        assert_eq!(doc.key_value(), json!(42));
        assert_eq!(doc.persisted_body(), json!({"_id": 42, "name": "a"}));
    }

    #[test]
    fn test_persisted_body_falls_back_to_string_key() {
        let missing = StoredDocument {
            key: RecordKey::new("7"),
            body: json!({"name": "a"}),
        };
        assert_eq!(missing.persisted_body(), json!({"_id": "7", "name": "a"}));

        // An `_id` that disagrees with the key is replaced by the key.
        let mismatched = StoredDocument {
            key: RecordKey::new("7"),
            body: json!({"_id": 8}),
        };
        assert_eq!(mismatched.persisted_body(), json!({"_id": "7"}));

        let scalar = StoredDocument {
            key: RecordKey::new("1"),
            body: json!(5),
        };
        assert_eq!(scalar.persisted_body(), json!({"_id": "1", "value": 5}));
    }

    #[test]
    fn test_key_from_json() {
        assert_eq!(RecordKey::from_json(&json!("abc")), Some(RecordKey::new("abc")));
        assert_eq!(RecordKey::from_json(&json!(42)), Some(RecordKey::new("42")));
        assert_eq!(RecordKey::from_json(&json!("  ")), None);
        assert_eq!(RecordKey::from_json(&json!(1.5)), None);
        assert_eq!(RecordKey::from_json(&json!(null)), None);
    }
}
