//! Errors produced while parsing and loading content documents

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A recognized front-matter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Date,
    Draft,
}

impl Field {
    /// The key as written in the metadata block
    pub fn key(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Date => "date",
            Field::Draft => "draft",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a document could not be parsed
///
/// Line numbers are 1-based and refer to the original input text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing front-matter block (expected a line `---` to open and another to close it)")]
    MissingMetadataBlock,

    #[error("line {line}: missing required field `{field}`")]
    MissingRequiredField { field: Field, line: usize },

    #[error("line {line}: malformed field `{field}`: {reason}")]
    MalformedField {
        field: Field,
        reason: String,
        line: usize,
    },

    #[error("line {line}: malformed front-matter: {reason}")]
    MalformedMetadata { reason: String, line: usize },
}

impl ParseError {
    /// Line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::MissingMetadataBlock => None,
            ParseError::MissingRequiredField { line, .. }
            | ParseError::MalformedField { line, .. }
            | ParseError::MalformedMetadata { line, .. } => Some(*line),
        }
    }

    /// The message without its line prefix
    pub fn detail(&self) -> String {
        match self {
            ParseError::MissingMetadataBlock => self.to_string(),
            ParseError::MissingRequiredField { field, .. } => {
                format!("missing required field `{}`", field)
            }
            ParseError::MalformedField { field, reason, .. } => {
                format!("malformed field `{}`: {}", field, reason)
            }
            ParseError::MalformedMetadata { reason, .. } => {
                format!("malformed front-matter: {}", reason)
            }
        }
    }

    /// The field involved, for field-level errors
    pub fn field(&self) -> Option<Field> {
        match self {
            ParseError::MissingRequiredField { field, .. }
            | ParseError::MalformedField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// A failure to load one file from the content directory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// Path of the file that failed
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }
}
