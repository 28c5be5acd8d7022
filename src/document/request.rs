//! Prepared request handed to provider adapters

use super::FormatConfig;
use crate::macros::MacroWarning;
use crate::types::ConversationRequest;
use serde::Serialize;

/// Resolved conversation plus the document sections a provider adapter consumes.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRequest {
    pub conversation: ConversationRequest,
    /// Generation options (model, temperature, ...) with `format` lifted out
    pub generation: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatConfig>,
    pub routing: serde_json::Map<String, serde_json::Value>,
    /// Caller metadata; always carries a `trace_id`
    pub meta: serde_json::Map<String, serde_json::Value>,
    /// Macro directives left verbatim during resolution
    #[serde(skip)]
    pub warnings: Vec<MacroWarning>,
}

impl PreparedRequest {
    pub fn model(&self) -> Option<&str> {
        self.generation.get("model").and_then(|v| v.as_str())
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.meta.get("trace_id").and_then(|v| v.as_str())
    }
}
