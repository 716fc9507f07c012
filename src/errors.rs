//! Error handling for the CLI crate

use std::path::PathBuf;

use cdp_adapter::AdapterError;
use probe_engine::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid plan {path}: {message}")]
    Plan { path: PathBuf, message: String },

    #[error("invalid url '{0}': {1}")]
    Url(String, url::ParseError),

    #[error("browser error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("failed to render output: {0}")]
    Render(String),
}

impl AppError {
    pub fn plan(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppError::Plan {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
