//! Error handling for tfmigrate-store
//!
//! Maps HTTP answers and transport failures onto core `MigrateError`s

use tfmigrate_core::errors::MigrateError;

/// Result type alias using MigrateError
pub type Result<T> = std::result::Result<T, MigrateError>;

/// A write was answered with something other than 201
pub fn store_rejected(status: reqwest::StatusCode, body: String) -> MigrateError {
    MigrateError::StoreRejected {
        status: status.to_string(),
        body,
    }
}

/// A delete was answered with something other than 200 or 404
pub fn delete_failed(status: reqwest::StatusCode, body: String) -> MigrateError {
    MigrateError::LockFailed {
        status: status.to_string(),
        body,
    }
}

/// The request never produced a response
///
/// The URL carries the API token as a query parameter, so it is stripped
/// before the error is rendered.
pub fn transport(err: reqwest::Error) -> MigrateError {
    MigrateError::Transport {
        message: err.without_url().to_string(),
    }
}
