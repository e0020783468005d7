//! Error types for freshrss-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from durable state operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (save path, typed value encode).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// State file exists but could not be parsed.
    #[error("failed to parse unit state at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value exists but does not decode as the requested type.
    #[error("stored value for '{key}' has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// All errors that can arise from loading or interpreting charm configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load. Includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `db-uri` is set but is not a usable database URI.
    #[error("invalid db-uri: {reason}")]
    InvalidDbUri { reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
