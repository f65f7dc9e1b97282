//! Configuration-time error types.
//!
//! Everything that can go wrong while a mock is being *built* surfaces as a
//! [`ConfigError`]. Request-time problems never do: they become HTTP
//! responses (404 for no match, 500 for unreadable bodies).

use std::path::PathBuf;

/// Error raised while composing handlers or registering endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration for {parameter}: {value:?}")]
    InvalidDuration {
        parameter: &'static str,
        value: String,
    },

    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid XPath expression {expression:?}: {message}")]
    InvalidXPath { expression: String, message: String },

    #[error("invalid header {name:?}: {value:?}")]
    InvalidHeader { name: String, value: String },

    #[error("invalid HTTP status code {0}")]
    InvalidStatus(u16),

    #[error("default case declared more than once in the same switch")]
    DuplicateDefault,

    #[error("endpoint {0:?} is already registered")]
    DuplicateEndpoint(String),

    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error raised while importing WireMock mapping files.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base64Body in {path}: {source}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    #[error("mapping {path} could not be registered: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}
