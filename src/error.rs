//! Error types for the profile-application engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed document: invalid JSON or invalid UTF-8
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("'{name}' command not found in PATH. Is Claude Code installed?")]
    ExecutableNotFound { name: String },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Self::ProfileNotFound { name: name.into() }
    }
}
