//! Role-tagged message fragments and turns

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Origin reserved for caller-supplied literal messages.
pub const CUSTOM_ORIGIN: &str = "custom";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Parse a role key as written in documents and preset files.
    ///
    /// Accepts a numbered prefix (`"1.user"`, `"2. assistant"`) and any casing.
    pub fn parse_key(raw: &str) -> Result<Self> {
        let token = raw.trim();
        let token = match token.split_once('.') {
            Some((prefix, rest))
                if !prefix.trim().is_empty()
                    && prefix.trim().chars().all(|c| c.is_ascii_digit()) =>
            {
                rest.trim()
            }
            _ => token,
        };
        token.parse()
    }
}

impl FromStr for MessageRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(Error::invalid_role(s, ErrorContext::new())),
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a local file forwarded alongside a user turn.
///
/// The path is never opened here; upload or inlining belongs to the provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Attachment {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let media_type = guess_media_type(&path);
        Self { path, media_type }
    }
}

fn guess_media_type(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mt.to_string())
}

/// Atomic unit produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFragment {
    pub role: MessageRole,
    pub content: String,
    /// Preset name, or [`CUSTOM_ORIGIN`] for caller literals
    pub origin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl MessageFragment {
    pub fn new(role: MessageRole, content: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            origin: origin.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }
}

/// Non-system conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Turn {
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

impl From<MessageFragment> for Turn {
    fn from(fragment: MessageFragment) -> Self {
        Self {
            role: fragment.role,
            content: fragment.content,
            origin: fragment.origin,
            attachments: fragment.attachments,
        }
    }
}
