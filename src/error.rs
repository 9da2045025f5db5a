//! Error types for tartarus.

use thiserror::Error;

/// Errors raised while validating value types and entry records.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid entry format: missing required key \"{key}\"")]
    MissingKey { key: &'static str },

    #[error("Invalid entry format: key \"{key}\" must be {expected}")]
    InvalidType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("Invalid timestamp format: \"{value}\" ({source})")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: TimestampError,
    },

    #[error("Invalid ciphertext format: {source}")]
    InvalidCiphertext {
        #[source]
        source: base64::DecodeError,
    },

    #[error("Plaintext is not valid UTF-8")]
    InvalidUtf8,

    #[error("Cannot generate plaintext: no character classes enabled")]
    EmptyAlphabet,

    #[error("Invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate entry id: {id}")]
    DuplicateEntryId { id: String },
}

/// Errors raised by the timestamp codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("expected exactly one 'T' between date and time")]
    MissingSeparator,

    #[error("time must have 2 or 3 colon-separated components, found {count}")]
    InvalidTimeComponents { count: usize },

    #[error("malformed fractional seconds")]
    InvalidFraction,

    #[error("invalid {field}: \"{value}\"")]
    InvalidField { field: &'static str, value: String },

    #[error("date or time out of range")]
    OutOfRange,
}

/// Errors reported by a cryptographic backend.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Codec backend unavailable: {0}")]
    Unavailable(String),

    #[error("Encoding failed for key {key_id}: {reason}")]
    EncodingFailed { key_id: String, reason: String },

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
}

/// Errors raised while migrating a store between schema versions.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("Cannot migrate backwards from schema version {from} to {to}")]
    Downgrade { from: u32, to: u32 },

    #[error("Migration from schema version {from} to {to} failed: {reason}")]
    StepFailed { from: u32, to: u32, reason: String },
}

/// Main error type for tartarus operations.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Secrets do not match")]
    SecretMismatch,

    #[error("No secret provided")]
    NoSecret,

    #[error("Operation cancelled by user")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, VaultError>;
