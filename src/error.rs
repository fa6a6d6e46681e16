//! Unified error types for depbom.
//!
//! Per-format parse failures are recoverable and never reach this type
//! (the parser dispatcher logs them and yields an empty package set).
//! Everything here is either fatal for a run (missing project path,
//! unwritable output, invalid configuration) or reported as a warning by
//! the caller (external tool failures, BOM submission).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for depbom operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DepBomError {
    /// Errors while rendering the BOM document
    #[error("BOM rendering failed: {context}")]
    Render {
        context: String,
        #[source]
        source: RenderErrorKind,
    },

    /// Errors while running an external build tool
    #[error("External tool failed: {context}")]
    Tool {
        context: String,
        #[source]
        source: ToolErrorKind,
    },

    /// Errors while submitting the BOM to a server
    #[error("BOM submission failed: {0}")]
    Submit(String),

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific render error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderErrorKind {
    #[error("XML writer error: {0}")]
    Xml(String),

    #[error("JSON serialization failed: {0}")]
    Json(String),
}

/// Specific external tool error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ToolErrorKind {
    #[error("could not spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("'{program}' timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("'{program}' exited with status {status}")]
    NonZeroExit { program: String, status: i32 },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for depbom operations
pub type Result<T> = std::result::Result<T, DepBomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl DepBomError {
    /// Create a render error
    pub fn render(context: impl Into<String>, source: RenderErrorKind) -> Self {
        Self::Render {
            context: context.into(),
            source,
        }
    }

    /// Create an external tool error
    pub fn tool(context: impl Into<String>, source: ToolErrorKind) -> Self {
        Self::Tool {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a submission error
    pub fn submit(message: impl Into<String>) -> Self {
        Self::Submit(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for DepBomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for DepBomError {
    fn from(err: serde_json::Error) -> Self {
        Self::render("JSON serialization", RenderErrorKind::Json(err.to_string()))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The new context is prepended to whatever context the error already
/// carries, so a failure deep inside rendering reads like
/// `"writing bom.xml: component list: XML writer error"`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (only evaluated on error).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<DepBomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: DepBomError, new_ctx: &str) -> DepBomError {
    match err {
        DepBomError::Render {
            context: existing,
            source,
        } => DepBomError::Render {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DepBomError::Tool {
            context: existing,
            source,
        } => DepBomError::Tool {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DepBomError::Io {
            path,
            message,
            source,
        } => DepBomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        DepBomError::Submit(msg) => DepBomError::Submit(chain_context(new_ctx, &msg)),
        DepBomError::Config(msg) => DepBomError::Config(chain_context(new_ctx, &msg)),
        DepBomError::Validation(msg) => DepBomError::Validation(chain_context(new_ctx, &msg)),
    }
}

fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
