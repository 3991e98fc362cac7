//! Infrastructure layer module
//!
//! - Database selection and the shared connection
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod database;
pub mod logging;
