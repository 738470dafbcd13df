use anyhow::Error;
use thiserror::Error;

/// Failure kinds of a deletion run.
///
/// Setup and listing failures are fatal to the whole run and travel as
/// `anyhow::Error` values wrapping one of these variants. A failed bulk-delete
/// call (`DeleteBatch`) is recovered inside the worker that issued it.
/// Cancellation is not an error: a cancelled run ends normally.
///
/// ## Exit Codes
///
/// - 1: ClientConstruction, Listing, DeleteBatch, Pipeline
/// - 2: InvalidConfig, InvalidDate
#[derive(Error, Debug, PartialEq)]
pub enum S3PruneError {
    /// Required configuration is missing or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The target date matched none of the supported formats.
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// The S3 client could not be created.
    #[error("Failed to create S3 client: {0}")]
    ClientConstruction(String),

    /// A listing page could not be fetched.
    #[error("Failed to list objects: {0}")]
    Listing(String),

    /// A bulk-delete call failed.
    #[error("Failed to delete objects: {0}")]
    DeleteBatch(String),

    /// General pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl S3PruneError {
    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            S3PruneError::InvalidConfig(_) | S3PruneError::InvalidDate(_) => 2,
            _ => 1,
        }
    }
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<S3PruneError>() {
        return err.exit_code();
    }
    1
}
