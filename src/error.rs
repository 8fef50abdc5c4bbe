use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelCacheError>;

/// Errors raised by the relationship id cache.
#[derive(Debug, Error)]
pub enum RelCacheError {
    /// The operation is not supported by this array variant.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// An iterator was asked for an id it does not have yet.
    #[error("relationship id iterator exhausted")]
    Exhausted,
    /// A raw direction tag or name had no matching direction.
    #[error("invalid direction value: {0}")]
    InvalidDirection(String),
    /// Options failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Options could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    /// I/O error while reading options.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The relationship source failed to produce a batch.
    #[error("relationship source error: {0}")]
    Source(String),
}
