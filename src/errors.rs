//! Error types for the weft system.

use thiserror::Error;

/// Main error type for weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk name (or reference to one) that no registered full name satisfies.
    #[error("cannot resolve {name:?}")]
    UnknownName { name: String, line: Option<usize> },

    /// An abbreviated name with more than one registered full-name match.
    #[error("ambiguous chunk name {name:?}: matches {matches:?}")]
    AmbiguousName { name: String, matches: Vec<String> },

    /// A chunk was defined under an abbreviation with no registered full name.
    #[error("no full name registered for abbreviated definition {0:?}")]
    UnresolvedAbbreviation(String),

    /// An authoring mistake in document structure, e.g. tangling an
    /// anonymous chunk or a cross-reference command.
    #[error("{0}")]
    Structural(String),

    #[error("malformed directive arguments: {0}")]
    OptionParse(String),

    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for weft operations.
pub type Result<T> = std::result::Result<T, WeftError>;
