//! Common utilities shared across the shop workspace:
//!
//! - Runtime configuration types
//! - Build-time YAML include resolution
//! - Shared test utilities and database helpers

pub mod config;
pub mod yaml_include;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{create_test_connection, generate_unique_id, get_test_database_url};
