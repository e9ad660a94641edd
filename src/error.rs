//! Error types shared by every converter and viewer.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("unknown category '{name}'")]
    UnknownCategory { name: String },

    #[error("category id {id} is out of range for a table of {len} categories")]
    IndexOutOfRange { id: usize, len: usize },

    #[error("parse error: {reason}")]
    Parse { reason: String },

    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidField { field: String, value: String },

    #[error("value {value} of '{field}' lies outside [0, 1]")]
    OutOfBounds { field: String, value: f64 },

    #[error("destination already exists: {}", path.display())]
    DestinationConflict { path: PathBuf },

    #[error("counterpart file does not exist: {}", path.display())]
    MissingPair { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to write XML: {0}")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Error::Parse {
            reason: reason.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }

    /// Attach the path of the file being processed. Errors that already name
    /// their path are returned unchanged.
    pub fn at(self, path: impl AsRef<Path>) -> Self {
        match self {
            Error::File { .. } | Error::DestinationConflict { .. } | Error::MissingPair { .. } => {
                self
            }
            other => Error::File {
                path: path.as_ref().to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with any path wrappers removed.
    pub fn kind(&self) -> &Error {
        match self {
            Error::File { source, .. } => source.kind(),
            other => other,
        }
    }

    /// The path this error refers to, if one was attached.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::File { path, .. }
            | Error::DestinationConflict { path }
            | Error::MissingPair { path } => Some(path),
            _ => None,
        }
    }
}

/// Extension for attaching a path to any fallible operation.
pub trait ResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| e.into().at(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_wraps_once() {
        let err = Error::missing_field("size.width")
            .at("a.xml")
            .at("outer.xml");
        assert_eq!(err.path(), Some(Path::new("a.xml")));
        assert!(matches!(err.kind(), Error::MissingField { field } if field == "size.width"));
        assert_eq!(
            err.to_string(),
            "a.xml: missing required field 'size.width'"
        );
    }

    #[test]
    fn test_conflict_keeps_own_path() {
        let err = Error::DestinationConflict {
            path: PathBuf::from("out/a.txt"),
        }
        .at("in/a.xml");
        assert_eq!(err.path(), Some(Path::new("out/a.txt")));
    }
}
