//! Public error types for the binding API.
//!
//! Every public entry point reports failures as data: an [`Error`] is turned
//! into an [`ErrorRecord`] (`{message, stack}`) before it leaves the engine.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::evaluator::EvalError;
use crate::parser::{ParseError, Span};

/// Public error type for all binding operations.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// The source text could not be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The expression is larger than the configured ceiling.
    #[error("Expression size ({size}) exceeds max ({max}).")]
    SizeExceeded { size: usize, max: usize },

    /// Evaluation failed.
    #[error("{0}")]
    Evaluation(#[from] EvalError),

    /// The result is not an acceptable value for the bound attribute.
    #[error("\"{target_kind}[{attribute}]\" is set to invalid value \"{value}\".")]
    Validation {
        target_kind: String,
        attribute: String,
        value: String,
    },
}

impl Error {
    /// The plain-data form returned across public boundaries.
    pub fn to_record(&self) -> ErrorRecord {
        let stack = match self {
            Error::Parse(e) if !e.detail.is_empty() => Some(e.detail.clone()),
            _ => None,
        };
        ErrorRecord {
            message: self.to_string(),
            stack,
        }
    }
}

/// Serializable error shape: `{message, stack}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }
}

impl From<&Error> for ErrorRecord {
    fn from(err: &Error) -> Self {
        err.to_record()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Help texts suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}
