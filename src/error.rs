//! Error types for every pipeline stage
//!
//! Each stage raises exactly one structured error kind; the runner converts
//! whatever reaches the pipeline boundary into a
//! [`PipelineResult::Failure`](crate::runner::PipelineResult) string. The
//! `Display` format is part of the user-visible protocol: `Kind: message at
//! line:col`.

use thiserror::Error;

use crate::span::Span;

/// Result type alias used throughout the pipeline stages.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured pipeline error: kind, human message, source position.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("LexError: {message} at {span}")]
    Lex { message: String, span: Span },

    #[error("ParseError: {message} at {span}")]
    Parse { message: String, span: Span },

    #[error("TypeError: {message} at {span}")]
    Type { message: String, span: Span },

    #[error("RuntimeError: {message} at {span}")]
    Runtime { message: String, span: Span },

    /// Invariant violations that should be impossible; aborts the process.
    #[error("InternalError: {message} at {span}")]
    Internal { message: String, span: Span },
}

impl Error {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex {
            message: message.into(),
            span,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    pub fn runtime(message: impl Into<String>, span: Span) -> Self {
        Self::Runtime {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Lex { span, .. }
            | Self::Parse { span, .. }
            | Self::Type { span, .. }
            | Self::Runtime { span, .. }
            | Self::Internal { span, .. } => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. }
            | Self::Parse { message, .. }
            | Self::Type { message, .. }
            | Self::Runtime { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}
