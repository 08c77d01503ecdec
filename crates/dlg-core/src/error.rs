use crate::types::SourceSpan;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl DialogueError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }

    /// Keeps code and span, prefixing the message with where the failure happened.
    pub fn prefixed(self, origin: impl std::fmt::Display) -> Self {
        Self {
            message: format!("{}: {}", origin, self.message),
            ..self
        }
    }
}
