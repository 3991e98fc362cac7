//! MongoDB driver.

pub mod connection;
pub mod document_store;

pub use connection::{create_client, ping, ClientConfig};
pub use document_store::MongoDocumentStore;

use mongodb::bson::{self, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure as MongoWriteFailure};
use serde_json::Value;

use crate::domain::errors::{BulkWriteFailure, IndexedFailure, StoreError, WriteFailure, WriteFailureKind};
use crate::domain::models::{Condition, Filter, QueryOptions, RecordKey, StoredDocument, KEY_FIELD};

/// Server codes reported for a unique index violation.
const DUPLICATE_KEY_CODES: [i32; 3] = [11000, 11001, 12582];

pub(crate) fn classify_write_error(code: i32, message: &str) -> WriteFailure {
    let kind = if DUPLICATE_KEY_CODES.contains(&code) {
        WriteFailureKind::DuplicateKey
    } else {
        WriteFailureKind::Other
    };
    WriteFailure::new(kind, message).with_code(code)
}

/// Map a driver error onto the driver-neutral store error.
pub(crate) fn map_mongo_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => {
            let failures = failure
                .write_errors
                .iter()
                .flatten()
                .map(|e| IndexedFailure::new(e.index, classify_write_error(e.code, &e.message)))
                .collect();
            StoreError::BulkWrite(BulkWriteFailure {
                failures,
                write_concern: failure
                    .write_concern_error
                    .as_ref()
                    .map(|wc| format!("{} ({})", wc.message, wc.code)),
            })
        }
        ErrorKind::Write(MongoWriteFailure::WriteError(e)) => {
            StoreError::Write(classify_write_error(e.code, &e.message))
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            StoreError::Serialization(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

pub(crate) fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Relaxed extended JSON, so numbers stay plain JSON numbers.
pub(crate) fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// Document as inserted: the body's fields with `_id` set to the key value.
pub(crate) fn to_insert_document(document: &StoredDocument) -> Result<Document, StoreError> {
    match to_bson(&document.persisted_body())? {
        Bson::Document(doc) => Ok(doc),
        other => Err(StoreError::Serialization(format!(
            "expected a document, got {other}"
        ))),
    }
}

/// `_id` values a key may be stored under. A key that reads as an integer
/// may have been written by a record with a numeric `_id`.
fn key_candidates(key: &RecordKey) -> Vec<Bson> {
    let mut candidates = vec![Bson::String(key.as_str().to_string())];
    if let Ok(n) = key.as_str().parse::<i64>() {
        candidates.push(Bson::Int64(n));
    }
    candidates
}

fn key_clause(key: &RecordKey) -> Bson {
    match key_candidates(key).as_slice() {
        [only] => only.clone(),
        candidates => {
            let mut in_clause = Document::new();
            in_clause.insert("$in", candidates.to_vec());
            Bson::Document(in_clause)
        }
    }
}

pub(crate) fn filter_to_document(filter: &Filter) -> Result<Document, StoreError> {
    let mut clauses = Vec::with_capacity(filter.conditions().len());
    for condition in filter.conditions() {
        let (field, value) = match condition {
            Condition::Key(key) => (KEY_FIELD.to_string(), key_clause(key)),
            Condition::KeyIn(keys) => {
                let keys: Vec<Bson> = keys.iter().flat_map(key_candidates).collect();
                let mut in_clause = Document::new();
                in_clause.insert("$in", keys);
                (KEY_FIELD.to_string(), Bson::Document(in_clause))
            }
            Condition::Field { path, value } => (path.clone(), to_bson(value)?),
        };
        clauses.push((field, value));
    }

    let mut document = Document::new();
    let repeated = clauses
        .iter()
        .enumerate()
        .any(|(i, (field, _))| clauses[..i].iter().any(|(f, _)| f == field));
    if repeated {
        let all: Vec<Bson> = clauses
            .into_iter()
            .map(|(field, value)| {
                let mut clause = Document::new();
                clause.insert(field, value);
                Bson::Document(clause)
            })
            .collect();
        document.insert("$and", all);
    } else {
        for (field, value) in clauses {
            document.insert(field, value);
        }
    }
    Ok(document)
}

pub(crate) fn sort_document(options: &QueryOptions) -> Option<Document> {
    if options.sort.is_empty() {
        return None;
    }
    let mut sort = Document::new();
    for option in &options.sort {
        sort.insert(option.field.clone(), option.direction.as_i32());
    }
    Some(sort)
}

/// Inclusion projection. The server returns `_id` unless told otherwise.
pub(crate) fn projection_document(options: &QueryOptions) -> Option<Document> {
    let fields = options.projection.as_ref()?;
    let mut projection = Document::new();
    for field in fields {
        projection.insert(field.clone(), 1);
    }
    Some(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{RecordKey, SortOption};
    use mongodb::bson::doc;
    use serde_json::json;

    #[test]
    fn test_duplicate_key_codes() {
        assert!(classify_write_error(11000, "E11000 duplicate key").is_duplicate_key());
        let other = classify_write_error(2, "bad value");
        assert!(!other.is_duplicate_key());
        assert_eq!(other.code, Some(2));
    }

    #[test]
    fn test_filter_translation() {
        let filter = Filter::by_key("abc").eq("meta.tier", 2);
        assert_eq!(
            filter_to_document(&filter).unwrap(),
            doc! {"_id": "abc", "meta.tier": 2_i64}
        );

        let keys = Filter::by_keys(vec![RecordKey::new("a"), RecordKey::new("b")]);
        assert_eq!(
            filter_to_document(&keys).unwrap(),
            doc! {"_id": {"$in": ["a", "b"]}}
        );

        assert_eq!(filter_to_document(&Filter::all()).unwrap(), doc! {});
    }

    #[test]
    fn test_repeated_field_uses_and() {
        let filter = Filter::all().eq("kind", "x").eq("kind", "y");
        assert_eq!(
            filter_to_document(&filter).unwrap(),
            doc! {"$and": [{"kind": "x"}, {"kind": "y"}]}
        );
    }

    #[test]
    fn test_numeric_key_matches_either_type() {
        let filter = Filter::by_key("42");
        assert_eq!(
            filter_to_document(&filter).unwrap(),
            doc! {"_id": {"$in": ["42", 42_i64]}}
        );

        let keys = Filter::by_keys(vec![RecordKey::new("7"), RecordKey::new("x")]);
        assert_eq!(
            filter_to_document(&keys).unwrap(),
            doc! {"_id": {"$in": ["7", 7_i64, "x"]}}
        );
    }

    #[test]
    fn test_insert_document_keeps_id_type() {
        let numeric = StoredDocument {
            key: RecordKey::new("42"),
            body: json!({"_id": 42, "name": "a"}),
        };
        let doc = to_insert_document(&numeric).unwrap();
        assert_eq!(doc.get_i64("_id").unwrap(), 42);
        assert_eq!(doc.get_str("name").unwrap(), "a");

        let keyless = StoredDocument {
            key: RecordKey::new("9"),
            body: json!({"name": "b"}),
        };
        assert_eq!(to_insert_document(&keyless).unwrap().get_str("_id").unwrap(), "9");
    }

    #[test]
    fn test_sort_and_projection_documents() {
        let options = QueryOptions::default()
            .sort_by(SortOption::desc("price"))
            .sort_by(SortOption::asc("name"))
            .project(["name"]);

        assert_eq!(sort_document(&options), Some(doc! {"price": -1, "name": 1}));
        assert_eq!(projection_document(&options), Some(doc! {"name": 1}));
        assert_eq!(sort_document(&QueryOptions::default()), None);
        assert_eq!(projection_document(&QueryOptions::default()), None);
    }

    #[test]
    fn test_relaxed_json_round_trip() {
        let value = to_json(doc! {"_id": "1", "price": 3_i32, "ratio": 0.5});
        assert_eq!(value, json!({"_id": "1", "price": 3, "ratio": 0.5}));
    }
}
