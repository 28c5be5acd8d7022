//! Declarative entries accepted by the assembler

use super::message::{Attachment, MessageRole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a stored preset or group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateRef {
    #[serde(rename = "preset")]
    Preset(String),
    #[serde(rename = "preset-group")]
    Group(String),
}

impl TemplateRef {
    pub fn preset(name: impl Into<String>) -> Self {
        TemplateRef::Preset(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        TemplateRef::Group(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            TemplateRef::Preset(name) | TemplateRef::Group(name) => name,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateRef::Preset(_) => TemplateKind::Preset,
            TemplateRef::Group(_) => TemplateKind::Group,
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

/// Which storage area a definition lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Preset,
    Group,
}

impl TemplateKind {
    /// Directory name of this kind's area under a store root
    pub fn area(&self) -> &'static str {
        match self {
            TemplateKind::Preset => "preset",
            TemplateKind::Group => "groups",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            TemplateKind::Preset => TemplateKind::Group,
            TemplateKind::Group => TemplateKind::Preset,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Preset => f.write_str("preset"),
            TemplateKind::Group => f.write_str("group"),
        }
    }
}

/// Literal message written directly by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// One item of the caller's top-level entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    Message(LiteralMessage),
    Reference(TemplateRef),
}

impl Entry {
    pub fn system(content: impl Into<String>) -> Self {
        Self::message(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::message(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::message(MessageRole::Assistant, content)
    }

    pub fn message(role: MessageRole, content: impl Into<String>) -> Self {
        Entry::Message(LiteralMessage {
            role,
            content: content.into(),
            attachments: Vec::new(),
        })
    }

    /// User message carrying image attachments
    pub fn user_with_images<I, P>(content: impl Into<String>, images: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<std::path::Path>,
    {
        Entry::Message(LiteralMessage {
            role: MessageRole::User,
            content: content.into(),
            attachments: images.into_iter().map(Attachment::new).collect(),
        })
    }

    pub fn preset(name: impl Into<String>) -> Self {
        Entry::Reference(TemplateRef::preset(name))
    }

    pub fn group(name: impl Into<String>) -> Self {
        Entry::Reference(TemplateRef::group(name))
    }
}
