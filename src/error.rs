//! Unified SDK error types.

use std::fmt;
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Schema validation error: {0}")]
    Schema(#[from] SchemaValidationError),

    #[error("Invalid usage: {0}")]
    InvalidUsage(#[from] InvalidUsageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Async process at {location} did not finish within {waited_secs}s")]
    AsyncTimeout { location: String, waited_secs: u64 },

    #[error("Async process failed with status {status}: {message}")]
    AsyncProcessUnsuccessful { status: String, message: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

// ─── Schema validation ───────────────────────────────────────────────────────

/// A payload disagreed with its declared schema.
///
/// `path` points at the offending field, e.g. `backtests[1].index`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: {kind}")]
pub struct SchemaValidationError {
    pub path: String,
    pub kind: SchemaErrorKind,
}

impl SchemaValidationError {
    pub fn new(path: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaErrorKind {
    MissingField,
    WrongType {
        expected: String,
        found: &'static str,
    },
    InvalidEnumValue {
        value: String,
        allowed: Vec<String>,
    },
    UnexpectedField,
    /// Raised while building a schema, not while validating a payload.
    DuplicateTarget,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaErrorKind::MissingField => write!(f, "missing required field"),
            SchemaErrorKind::WrongType { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            SchemaErrorKind::InvalidEnumValue { value, allowed } => {
                write!(f, "invalid value {:?}, expected one of {:?}", value, allowed)
            }
            SchemaErrorKind::UnexpectedField => write!(f, "unexpected field"),
            SchemaErrorKind::DuplicateTarget => write!(f, "duplicate target key"),
        }
    }
}

// ─── Invalid usage ───────────────────────────────────────────────────────────

/// Caller-supplied arguments contradict each other. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidUsageError {
    #[error("Backtest {index}: both duration and start/end fields supplied ({fields:?})")]
    AmbiguousBacktest { index: u32, fields: Vec<String> },

    #[error(
        "Backtest {index}: neither a complete duration spec nor a complete start/end spec \
         (got {present:?})"
    )]
    IncompleteBacktest { index: u32, present: Vec<String> },

    #[error("{field} must be a {expected}, not {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Conflicting fields: {0}")]
    ConflictingFields(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No endpoint configured")]
    MissingEndpoint,

    #[error("No API token configured")]
    MissingToken,
}

pub type SdkResult<T> = Result<T, SdkError>;
