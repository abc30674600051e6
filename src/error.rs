//! Error types for Babel Tavern.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Error raised while classifying, validating or constructing a card.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document names a card spec/version pair we don't support
    #[error("Unsupported card spec {spec} (version {version})")]
    UnsupportedSpec { spec: String, version: String },

    /// The document doesn't look like any known card
    #[error("Document does not match any known character card schema")]
    Unrecognized,

    /// The document has a recognized shape that isn't handled yet
    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),

    /// The document failed structural validation
    #[error("Invalid {record}: {}", violations.join("; "))]
    Invalid {
        record: &'static str,
        violations: Vec<String>,
    },
}

/// Error raised by the tree walker.
///
/// Both variants point at a record declaration that disagrees with the
/// record's own fields, not at bad input data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// A declared field is absent on the record
    #[error("Field '{field}' is not present on {record}")]
    MissingField { record: &'static str, field: String },

    /// A declared field holds something other than text or records
    #[error("Field '{field}' on {record} holds a {found}, not text or records")]
    Shape {
        record: &'static str,
        field: String,
        found: &'static str,
    },
}

/// Error type for text-generation backends.
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP request to the API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse the API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The model answered without any usable text
    #[error("No text returned from model for prompt: {0}")]
    NoOutput(String),

    /// Invalid API configuration
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

/// Error type for a translation run.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The card's declared fields couldn't be walked
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The backend failed for one of the leaves
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

