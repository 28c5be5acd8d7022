//! Canonical conversation request handed to provider adapters

use super::message::{Turn, CUSTOM_ORIGIN};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Merged system text for one origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SystemBlock {
    /// Named origin: every fragment joined with a blank line
    Joined(String),
    /// Reserved `custom` origin: independent literal lines, never joined
    Custom(Vec<String>),
}

impl SystemBlock {
    pub fn as_joined(&self) -> Option<&str> {
        match self {
            SystemBlock::Joined(text) => Some(text),
            SystemBlock::Custom(_) => None,
        }
    }

    pub fn as_custom(&self) -> Option<&[String]> {
        match self {
            SystemBlock::Joined(_) => None,
            SystemBlock::Custom(items) => Some(items),
        }
    }
}

/// Ordered mapping from origin to merged system text.
///
/// Named origins keep first-seen order; the `custom` block follows them and is only
/// present once a literal system line has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInstructions {
    named: Vec<(String, String)>,
    custom: Vec<String>,
}

impl SystemInstructions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge text into a named origin, joining with a blank line.
    pub(crate) fn merge(&mut self, origin: &str, text: &str) {
        match self.named.iter_mut().find(|(o, _)| o == origin) {
            Some((_, existing)) => {
                existing.push_str("\n\n");
                existing.push_str(text);
            }
            None => self.named.push((origin.to_string(), text.to_string())),
        }
    }

    pub(crate) fn push_custom(&mut self, text: String) {
        self.custom.push(text);
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.custom.is_empty()
    }

    pub fn len(&self) -> usize {
        self.named.len() + usize::from(!self.custom.is_empty())
    }

    pub fn get(&self, origin: &str) -> Option<SystemBlock> {
        if origin == CUSTOM_ORIGIN {
            return (!self.custom.is_empty()).then(|| SystemBlock::Custom(self.custom.clone()));
        }
        self.named
            .iter()
            .find(|(o, _)| o == origin)
            .map(|(_, text)| SystemBlock::Joined(text.clone()))
    }

    /// Origins in output order
    pub fn origins(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.named.iter().map(|(o, _)| o.as_str()).collect();
        if !self.custom.is_empty() {
            keys.push(CUSTOM_ORIGIN);
        }
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SystemBlock)> + '_ {
        self.named
            .iter()
            .map(|(o, text)| (o.as_str(), SystemBlock::Joined(text.clone())))
            .chain(
                (!self.custom.is_empty())
                    .then(|| (CUSTOM_ORIGIN, SystemBlock::Custom(self.custom.clone()))),
            )
    }

    /// Compact JSON object, for adapters that accept a single system string.
    pub fn to_json_string(&self) -> String {
        // Serializing strings and string lists into a map cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for SystemInstructions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (origin, text) in &self.named {
            map.serialize_entry(origin, text)?;
        }
        if !self.custom.is_empty() {
            map.serialize_entry(CUSTOM_ORIGIN, &self.custom)?;
        }
        map.end()
    }
}

/// Final resolved conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRequest {
    pub system_instructions: SystemInstructions,
    pub history: Vec<Turn>,
    pub current_message: Turn,
}

impl ConversationRequest {
    /// History followed by the current turn
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter().chain(std::iter::once(&self.current_message))
    }
}
