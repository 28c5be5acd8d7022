//! Template store error types

/// Errors raised while locating or reading stored definitions
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Template not found: {kind} '{name}'{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    NotFound {
        kind: String,
        name: String,
        hint: Option<String>,
    },

    #[error("Ambiguous template name '{name}': matches {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Failed to load template from {path}: {reason}")]
    LoadError { path: String, reason: String },

    #[error("YAML syntax error in {path}: {reason}")]
    YamlError { path: String, reason: String },

    #[error("Invalid template name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl StoreError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        if let StoreError::NotFound { ref mut hint, .. } = self {
            *hint = hint_val;
        }
        self
    }
}
