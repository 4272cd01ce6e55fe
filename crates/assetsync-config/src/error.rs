//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A `{file:..}` or `{env:..}` reference could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Referenced file does not exist
    #[error("referenced file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Referenced file could not be read
    #[error("IO error reading {}: {error}", .path.display())]
    Io {
        /// Path to the file
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// Referenced TOML file could not be parsed
    #[error("parse error in {}: {error}", .path.display())]
    Parse {
        /// Path to the file
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// Environment variable not set
    #[error("environment variable not found: {var_name} (referenced as {{env:{var_name}}})")]
    EnvVarNotFound {
        /// Name of the environment variable
        var_name: String,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be written
    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or does not match the schema
    #[error("failed to parse config {}: {message}", .path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Selected profile is not defined in the file
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    /// One or more references failed to resolve
    #[error("unresolved references: {}", format_references(.0))]
    References(Vec<ReferenceError>),

    /// An environment override held an unusable value
    #[error("invalid value for {var}: {message}")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// Problem
        message: String,
    },

    /// A field failed validation
    #[error("invalid configuration: {field}: {message}")]
    Invalid {
        /// Dotted field path
        field: String,
        /// Problem
        message: String,
    },

    /// No config directory could be determined for this platform
    #[error("could not determine config directory")]
    NoConfigDir,

    /// Serialization for display failed
    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

fn format_references(errors: &[ReferenceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
