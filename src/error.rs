//! Error types for YAML parsing.

use thiserror::Error;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Error type for YAML parsing.
///
/// Every parse-time variant carries the 1-based line and column where
/// the failure was detected. The first fatal error aborts the parse;
/// there is no recovery.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Unexpected character, illegal directive, bad header, and other
    /// grammar violations.
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// Content at an unexpected column, bad block-scalar indentation.
    #[error("{message} at line {line}, column {column}")]
    Indentation {
        message: String,
        line: usize,
        column: usize,
    },

    /// Unknown alias, undeclared tag handle, duplicate anchor or key.
    #[error("{message} at line {line}, column {column}")]
    Reference {
        message: String,
        line: usize,
        column: usize,
    },

    /// Illegal hex, unicode, or percent escape.
    #[error("{message} at line {line}, column {column}")]
    Encoding {
        message: String,
        line: usize,
        column: usize,
    },

    /// `%YAML` version not 1.x.
    #[error("{message} at line {line}, column {column}")]
    Version {
        message: String,
        line: usize,
        column: usize,
    },

    /// Multi-document framing violations.
    #[error("{message} at line {line}, column {column}")]
    Structure {
        message: String,
        line: usize,
        column: usize,
    },

    /// A `get_tag` query against a pointer with no node.
    #[error("Node does not exist: {0}")]
    NoSuchNode(String),

    /// The filesystem entry point failed to read its input.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The 1-based line the error was reported at, if positional.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Indentation { line, .. }
            | ParseError::Reference { line, .. }
            | ParseError::Encoding { line, .. }
            | ParseError::Version { line, .. }
            | ParseError::Structure { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The 1-based column the error was reported at, if positional.
    pub fn column(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { column, .. }
            | ParseError::Indentation { column, .. }
            | ParseError::Reference { column, .. }
            | ParseError::Encoding { column, .. }
            | ParseError::Version { column, .. }
            | ParseError::Structure { column, .. } => Some(*column),
            _ => None,
        }
    }
}
