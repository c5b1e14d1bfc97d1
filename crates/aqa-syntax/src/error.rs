//! Error handling types and utilities for the AQA toolchain.
//!
//! Every component reports failures through one lightweight [`Error`] type:
//! a human-readable message plus an optional source location. Parse errors
//! carry a position; runtime errors usually do not.
//!
//! # Examples
//!
//! ```rust
//! use aqa_syntax::error::{Error, Result, error};
//!
//! // A plain error
//! let plain = Error::new("could not read import");
//!
//! // An error with a source location (0-based line, column)
//! let located = Error::with_span("expected next token to be 'THEN'", 3, 12);
//!
//! fn check(n: i64) -> Result<i64> {
//!     if n < 0 {
//!         error("negative values are not supported")
//!     } else {
//!         Ok(n)
//!     }
//! }
//! ```

use std::fmt;

/// An error produced while lexing, parsing or evaluating AQA pseudocode.
///
/// `line` and `col` are 0-based and present only when the error can be
/// pinned to a source position (the CLI uses them to echo the offending
/// line with a caret).
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Human-readable error message.
    pub msg: String,

    /// Optional line number in the source (0-based).
    pub line: Option<usize>,

    /// Optional column number in the source (0-based).
    pub col: Option<usize>,
}

impl Error {
    /// Creates a new error with the given message and no source location.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// Creates a new error pinned to a source location.
    pub fn with_span(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.col) {
            write!(f, "{} at {}:{}", self.msg, line, col)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` for AQA toolchain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::with_span(msg, line, col))`.
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(msg, line, col))
}
