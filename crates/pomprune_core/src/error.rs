use std::path::PathBuf;

use thiserror::Error;

use crate::event::Position;

pub type ParseResult<T> = Result<T, ParseError>;

/// Well-formedness failure reported by the tokenizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed document at {pos}: {message}")]
    Malformed { pos: Position, message: String },

    #[error("Unexpected end of document: expected {expected}")]
    UnexpectedEof { expected: String },
}

impl ParseError {
    pub fn malformed(pos: Position, message: impl Into<String>) -> Self {
        Self::Malformed { pos, message: message.into() }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof { expected: expected.into() }
    }
}

/// Failure reading a project descriptor from disk.
#[derive(Error, Debug)]
pub enum PomError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{} declares unsupported encoding {label:?}", .path.display())]
    UnsupportedEncoding { path: PathBuf, label: String },

    #[error("{} is not valid {encoding}", .path.display())]
    InvalidEncoding { path: PathBuf, encoding: &'static str },

    #[error("{} does not declare a {field}", .path.display())]
    MissingCoordinate { path: PathBuf, field: &'static str },
}
