//! Error types for configuration loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using the workspace error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to produce a usable configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Config file exists but could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the schema
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Values parsed but are out of range
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap with a description of what was being attempted.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// File the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self.root() {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Adds context to a configuration result.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
