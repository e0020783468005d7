//! Error types for freshrss-site.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering or installing a site.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// The requested template is neither embedded nor provided as an override.
    #[error("unknown site template '{0}'")]
    UnknownTemplate(String),

    /// Filesystem error while loading overrides or writing the site.
    #[error("site io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
