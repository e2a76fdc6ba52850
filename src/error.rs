//! Error types for anaphor.

use thiserror::Error;

/// Result type for anaphor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for anaphor operations.
///
/// Every variant is terminal: nothing is retried and a failed run produces
/// no partial model or partition.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Unresolvable name, malformed feature list, or invalid option.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mention lacks a required attribute, or the corpus is malformed.
    #[error("Data error: {0}")]
    Data(String),

    /// Model was trained with a different schema or feature configuration.
    #[error("Model mismatch: {0}")]
    ModelMismatch(String),

    /// Model or config (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the core data model.
    #[error(transparent)]
    Core(anaphor_core::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a model mismatch error.
    pub fn model_mismatch(msg: impl Into<String>) -> Self {
        Error::ModelMismatch(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }
}

impl From<anaphor_core::Error> for Error {
    fn from(err: anaphor_core::Error) -> Self {
        match err {
            anaphor_core::Error::Data(msg) => Error::Data(msg),
            anaphor_core::Error::Io(io) => Error::Io(io),
            other => Error::Core(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("invalid TOML: {}", err))
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_data_error_maps_to_data() {
        let err: Error = anaphor_core::Error::data("missing gender").into();
        assert!(matches!(err, Error::Data(_)));
        assert_eq!(err.to_string(), "Data error: missing gender");
    }

    #[test]
    fn test_core_invalid_input_is_wrapped() {
        let err: Error = anaphor_core::Error::invalid_input("bad").into();
        assert!(matches!(err, Error::Core(_)));
        assert_eq!(err.to_string(), "Invalid input: bad");
    }
}
