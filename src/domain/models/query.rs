//! Driver-neutral filters and query options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{RecordKey, KEY_FIELD};

/// One equality condition of a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Identifying key equals.
    Key(RecordKey),
    /// Identifying key is one of.
    KeyIn(Vec<RecordKey>),
    /// Dotted field path equals a JSON value.
    Field { path: String, value: Value },
}

/// Conjunction of conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_key(key: impl Into<RecordKey>) -> Self {
        Self {
            conditions: vec![Condition::Key(key.into())],
        }
    }

    pub fn by_keys(keys: impl IntoIterator<Item = RecordKey>) -> Self {
        Self {
            conditions: vec![Condition::KeyIn(keys.into_iter().collect())],
        }
    }

    /// Add a field equality. `_id` is routed to the key condition.
    #[must_use]
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        let path = path.into();
        let value = value.into();
        if path == KEY_FIELD {
            if let Some(key) = RecordKey::from_json(&value) {
                self.conditions.push(Condition::Key(key));
                return self;
            }
        }
        self.conditions.push(Condition::Field { path, value });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against a JSON body whose key is `key`.
    ///
    /// Used by drivers that cannot push the filter down to the store.
    pub fn matches(&self, key: &RecordKey, body: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Key(k) => k == key,
            Condition::KeyIn(keys) => keys.contains(key),
            Condition::Field { path, value } => lookup_path(body, path) == Some(value),
        })
    }
}

/// Resolve a dotted path inside a JSON value.
pub fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(body, |current, segment| current.get(segment))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Numeric form used by the NoSQL driver: 1 ascending, -1 descending.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOption {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "{}:desc", self.field),
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    /// Parses `field`, `field:asc` or `field:desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((_, other)) => return Err(format!("invalid sort direction: {other}")),
            None => (s, SortDirection::Asc),
        };
        if field.trim().is_empty() {
            return Err("sort field cannot be empty".to_string());
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Sorting, projection and paging applied to a find.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub sort: Vec<SortOption>,
    /// Fields to include; `None` returns whole documents.
    pub projection: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryOptions {
    #[must_use]
    pub fn sort_by(mut self, option: SortOption) -> Self {
        self.sort.push(option);
        self
    }

    /// Return only `fields` of each document, plus `_id`, which is always
    /// included. Decoding a projection into a typed record only works when
    /// every field the type requires is listed; [`JsonDocument`] and raw
    /// values accept any projection.
    ///
    /// [`JsonDocument`]: super::JsonDocument
    #[must_use]
    pub fn project(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Keep only the projected top-level fields of a JSON object. `_id` is
/// always kept.
pub fn apply_projection(body: Value, fields: &[String]) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(name, _)| name == KEY_FIELD || fields.iter().any(|f| f == name))
                .collect(),
        ),
        other => other,
    }
}

/// Overwrite top-level fields of `target` with those of `fields`, the way a
/// `$set` update does. Returns true when anything changed.
pub fn apply_set(target: &mut Value, fields: Value) -> bool {
    let (Value::Object(existing), Value::Object(fields)) = (target, fields) else {
        return false;
    };
    let mut modified = false;
    for (name, value) in fields {
        if existing.get(&name) != Some(&value) {
            existing.insert(name, value);
            modified = true;
        }
    }
    modified
}

/// One page of a paginated find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of documents matching the filter, ignoring limit and offset.
    pub total: u64,
}
