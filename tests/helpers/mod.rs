//! Shared fixtures for the integration tests.
#![allow(dead_code)]

pub mod database;
pub mod scripted_store;

use docstore::{Record, RecordKey};
use serde::{Deserialize, Serialize};

/// Minimal record used across the suites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: i64,
}

impl Record for Product {
    fn key(&self) -> RecordKey {
        RecordKey::new(&self.id)
    }
}

pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price: 0,
    }
}

pub fn priced(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price,
    }
}

/// `[A(1), B(2), A'(1)]`: the third record collides with the first.
pub fn duplicate_batch() -> Vec<Product> {
    vec![product("1", "sss"), product("2", "aaa"), product("1", "mohamed")]
}
