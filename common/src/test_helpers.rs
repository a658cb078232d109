//! Shared Test Helpers for Cross-Crate Use
//!
//! Database connections, unique test data and the unified test error type
//! used by the `shop` test suites.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static GLOBAL_TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique string identifier in the format "{prefix}-{timestamp}-{counter}"
pub fn generate_unique_id(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let counter = GLOBAL_TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, timestamp, counter)
}

/// Get the test database URL from environment or default to in-memory SQLite
pub fn get_test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

/// Open a fresh connection for a single test.
///
/// The pool is pinned to one connection: every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn create_test_connection() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(get_test_database_url());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await
}

// =============================================================================
// UNIFIED TEST ERROR HANDLING
// =============================================================================

/// Unified error type for all test failures
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Assertion failed: {message}")]
    AssertionFailure { message: String },

    #[error("Database error: {source}")]
    DatabaseError {
        #[from]
        source: DbErr,
    },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("HTTP error: {source}")]
    HttpError {
        #[from]
        source: http::Error,
    },

    #[error("Generic test error: {message}")]
    Generic { message: String },
}

impl TestError {
    pub fn assertion_failure(message: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

/// Alias for the standard test result type
pub type TestResult<T = ()> = Result<T, TestError>;

/// Helper macro for test assertions that return TestError instead of panicking
#[macro_export]
macro_rules! test_assert {
    ($condition:expr) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!("assertion failed: {}", stringify!($condition))
            ));
        }
    };
    ($condition:expr, $message:expr $(, $arg:expr)*) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!($message $(, $arg)*)
            ));
        }
    };
}

/// Helper macro for test assertions with equality
#[macro_export]
macro_rules! test_assert_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!("assertion failed: `(left == right)`\n  left: `{:?}`,\n right: `{:?}`",
                                left_val, right_val)
                    ));
                }
            }
        }
    };
    ($left:expr, $right:expr, $message:expr $(, $arg:expr)*) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!($message $(, $arg)*)
                    ));
                }
            }
        }
    };
}

/// Utility functions for common test operations
pub mod test_utils {
    use super::*;

    /// HTTP request builder that returns TestError
    pub fn build_request(method: &str, uri: &str, body: Option<String>) -> TestResult<http::Request<String>> {
        let mut builder = http::Request::builder().uri(uri).method(method);

        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }

        let request = builder
            .body(body.unwrap_or_default())
            .map_err(TestError::from)?;

        Ok(request)
    }

    pub fn serialize_json<T: serde::Serialize>(value: &T) -> TestResult<String> {
        serde_json::to_string(value).map_err(TestError::from)
    }

    pub fn check_status_code(actual: http::StatusCode, expected: http::StatusCode) -> TestResult<()> {
        if actual != expected {
            return Err(TestError::assertion_failure(format!(
                "Status code mismatch: expected {}, got {}",
                expected, actual
            )));
        }
        Ok(())
    }

    pub fn check_error_contains(error: &dyn std::error::Error, expected_substring: &str) -> TestResult<()> {
        let error_msg = error.to_string();
        if !error_msg.contains(expected_substring) {
            return Err(TestError::assertion_failure(format!(
                "Error message '{}' does not contain '{}'",
                error_msg, expected_substring
            )));
        }
        Ok(())
    }
}
