//! Errors raised while loading and checking the YAML config.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between reading the file and handing out
/// a validated [`SwitchyardConfig`](crate::SwitchyardConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config path does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// File being read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error, including unknown fields.
    #[error("malformed YAML config: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A field holds a value the server cannot use.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server[0].listen`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be applied.
    #[error("cannot apply override {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A cross-field check failed.
    #[error("invalid config: {0}")]
    ValidationError(String),

    /// No client section carries the requested name.
    #[error("no client configured with name: {name}")]
    UnknownClient {
        /// The name that was looked up.
        name: String,
    },
}

impl ConfigError {
    /// Builds [`ConfigError::FileNotFound`].
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Builds [`ConfigError::ReadError`].
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Builds [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Builds [`ConfigError::EnvParseError`].
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Builds [`ConfigError::ValidationError`].
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Builds [`ConfigError::UnknownClient`].
    pub fn unknown_client(name: impl Into<String>) -> Self {
        Self::UnknownClient { name: name.into() }
    }
}
