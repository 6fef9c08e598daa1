//! Error kinds shared by the ACMI decoder and trajectory builder.
//!
//! Per the error-handling policy: recoverable text-structure errors degrade
//! the parsed document (`AcmiData::is_valid = false`) instead of being
//! returned as `Err`. Only container and cancellation failures are terminal.

use thiserror::Error;

/// Custom error type for the ACMI core, allows callers to differentiate
/// between recoverable (document-degrading) and terminal failures.
///
#[derive(Debug, Error)]
pub enum AcmiError {
    /// First two lines are missing entirely.
    #[error("missing ACMI header")]
    HeaderMissing,
    /// `FileType` present but not `text/acmi/tacview`.
    #[error("wrong file type: {0}")]
    HeaderWrongType(String),
    /// `FileVersion` present but not in the supported whitelist.
    #[error("unsupported file version: {0}")]
    HeaderUnsupportedVersion(String),
    /// A property fragment lacks `=`, or a numeric token failed to parse.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    /// ZIP entry count != 1, or extraction itself failed.
    #[error("corrupt container: {0}")]
    CorruptContainer(String),
    /// Cancelled via a `CancellationToken`.
    #[error("operation cancelled")]
    Cancelled,
    /// No valid reference time, or no non-empty frames.
    #[error("invalid time span")]
    InvalidTimeSpan,
}
