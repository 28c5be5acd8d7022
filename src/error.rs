use crate::store::StoreError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Location of the offending item (e.g., "preset:tutorial[2]", "messages[0].role")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected shape, actual value)
    pub details: Option<String>,
    /// Component that raised the error (e.g., "preset_resolver", "message_assembler")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for conversation resolution.
///
/// Every variant is fatal for the call that produced it; unrecognized macros are
/// reported separately as [`crate::macros::MacroWarning`] and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cyclic template reference: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("Invalid template reference: {message}{}", format_context(.context))]
    InvalidReference {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid role '{role}': expected one of system, user, assistant{}", format_context(.context))]
    InvalidRole { role: String, context: ErrorContext },

    #[error("No current turn: {message}")]
    MissingCurrentTurn { message: String },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },
}

/// Error category, independent of the payload each variant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    CycleDetected,
    InvalidReference,
    InvalidRole,
    EmptyOrMissingCurrentTurn,
    Validation,
    Load,
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("at: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create an invalid-reference error with structured context
    pub fn invalid_reference(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidReference {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_role(role: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidRole {
            role: role.into(),
            context,
        }
    }

    pub fn missing_current_turn(msg: impl Into<String>) -> Self {
        Error::MissingCurrentTurn {
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            Error::Store(StoreError::Ambiguous { .. }) => ErrorKind::Ambiguous,
            Error::Store(StoreError::InvalidName { .. }) => ErrorKind::Validation,
            Error::Store(_) => ErrorKind::Load,
            Error::CycleDetected { .. } => ErrorKind::CycleDetected,
            Error::InvalidReference { .. } => ErrorKind::InvalidReference,
            Error::InvalidRole { .. } => ErrorKind::InvalidRole,
            Error::MissingCurrentTurn { .. } => ErrorKind::EmptyOrMissingCurrentTurn,
            Error::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidReference { context, .. }
            | Error::InvalidRole { context, .. }
            | Error::Validation { context, .. } => Some(context),
            _ => None,
        }
    }
}
