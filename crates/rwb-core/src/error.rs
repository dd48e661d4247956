use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing element <{0}>")]
    MissingElement(&'static str),
}

#[derive(Error, Debug)]
pub enum BackupError {
    /// The scenario has no live save yet; the game has to save first.
    #[error("no save file in scenario")]
    NoSave,

    #[error("backup not found: {0}")]
    NotFound(String),

    #[error("invalid backup identifier: {0}")]
    InvalidId(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Nothing to do, as opposed to an operation that failed half-way.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoSave | Self::NotFound(_) | Self::InvalidId(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("no Content/Routes directory under {}", .0.display())]
    NoRoutes(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
