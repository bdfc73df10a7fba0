//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Raised at registration or construction time when a calculator is
/// structurally invalid. This is the one error class that surfaces
/// synchronously: it signals a configuration-time programmer error,
/// not a runtime data issue.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A calculator is missing a required contract member
    #[error("Calculator '{calculator}' has empty required metadata field '{field}'")]
    MissingMetadata { calculator: String, field: String },

    /// Lookup of a calculator that was never registered
    #[error("No calculator registered under name '{0}'")]
    UnknownCalculator(String),

    /// A name collision in the catalogue
    #[error("A calculator named '{0}' is already registered")]
    DuplicateName(String),

    /// Configuration value rejected by the calculator's constructor
    #[error("Invalid configuration for calculator '{calculator}': {message}")]
    InvalidConfig { calculator: String, message: String },
}

/// A whole-file or whole-codebase step failing. The offending entity is
/// skipped and recorded; the run continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The codebase handle could not enumerate its files. This is the only
    /// fault that aborts a run outright.
    #[error("Failed to enumerate files for project '{project}': {message}")]
    CodebaseEnumeration { project: String, message: String },

    /// A file-level step failed
    #[error("Failed to process file {}: {message}", file.display())]
    FileProcessing { file: PathBuf, message: String },
}

/// A storage transaction failure. The whole transaction rolls back and the
/// error propagates; in-memory metrics stay valid and usable.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    /// Backend returned no generated id for an inserted row
    #[error("No generated id available for inserted {table} row")]
    MissingId { table: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// A stored column failed to parse back into its domain type
    #[error("Invalid stored value in {table}.{column}: {message}")]
    InvalidValue {
        table: String,
        column: String,
        message: String,
    },

    /// A read query matched no rows where one was required
    #[error("No stored metrics found for project '{0}'")]
    NoSuchProject(String),
}

/// Main error type for codegauge operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
