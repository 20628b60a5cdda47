//! Error and diagnostic types for Routegen.
//!
//! Nothing in this crate is fatal to the host process. Per-entry failures
//! degrade to "this one artifact is stale or missing" and surface as
//! diagnostics on the pass report.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The front end failed to build a syntax tree for a source file.
    Parse,
    /// An output path could not be created or written.
    Write,
    /// Reading a source file or enumerating a directory failed.
    Io,
}

/// A per-entry failure, always carrying the offending relative source path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutegenError {
    pub kind: ErrorKind,
    pub message: String,
    pub path: String,
}

impl RoutegenError {
    pub fn parse(path: &str, detail: &str) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: detail.to_string(),
            path: path.to_string(),
        }
    }

    pub fn write(path: &str, detail: &str) -> Self {
        Self {
            kind: ErrorKind::Write,
            message: detail.to_string(),
            path: path.to_string(),
        }
    }

    pub fn io(path: &str, err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: err.to_string(),
            path: path.to_string(),
        }
    }
}

impl fmt::Display for RoutegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Parse => "parse error",
            ErrorKind::Write => "write error",
            ErrorKind::Io => "io error",
        };
        write!(f, "{} in {}: {}", kind, self.path, self.message)
    }
}

impl std::error::Error for RoutegenError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// A structured diagnostic collected during a reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub path: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            path,
        }
    }

    pub fn warning(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            path,
        }
    }
}

impl From<RoutegenError> for Diagnostic {
    fn from(err: RoutegenError) -> Self {
        let path = err.path.clone();
        Diagnostic::error(err.to_string(), Some(path))
    }
}
