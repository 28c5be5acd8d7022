//! 请求文档模块：解析 YAML 对话描述并生成可交给适配器的请求。
//!
//! # Request Document
//!
//! Parses one YAML conversation description into typed [`Entry`]s plus the
//! pass-through sections a provider adapter needs:
//!
//! ```yaml
//! messages:
//!   - preset: tutorial
//!   - preset-group: onboarding
//!   - system: Answer in {{random::English::French}}.
//!   - user: What is in this picture?
//!     images: [shots/cat.png]
//! generation:
//!   model: some-model
//!   temperature: 0.7
//!   format: json
//! meta:
//!   caller: docs
//! ```
//!
//! `messages` may also use the legacy mapping form (`{system: ..., user: [...]}`).

mod format;
mod request;

pub use format::FormatConfig;
pub use request::PreparedRequest;

use crate::assemble::MessageAssembler;
use crate::store::definition::{reference_of, yaml_key};
use crate::store::TemplateStore;
use crate::types::{Attachment, Entry, LiteralMessage, MessageRole};
use crate::{Error, ErrorContext, Result};
use rand::Rng;
use serde_json::Map;
use serde_yaml::{Mapping, Value};

type JsonMap = Map<String, serde_json::Value>;

/// Parsed conversation document, not yet resolved against a store.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDocument {
    pub entries: Vec<Entry>,
    pub generation: JsonMap,
    pub format: Option<FormatConfig>,
    pub routing: JsonMap,
    pub meta: JsonMap,
}

impl RequestDocument {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(raw).map_err(|e| {
            Error::validation_with_context(
                format!("document is not valid YAML: {}", e),
                ErrorContext::new().with_source("document"),
            )
        })?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_mapping()
            .filter(|m| m.contains_key("messages"))
            .ok_or_else(|| invalid("messages", "document must be a mapping with 'messages'"))?;

        let entries = match root.get("messages") {
            Some(Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| parse_entry(idx, item))
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Mapping(map)) => parse_legacy_messages(map)?,
            _ => return Err(invalid("messages", "messages must be a list or a mapping")),
        };

        let mut generation = optional_section(root, "generation")?;
        let format = match root
            .get("generation")
            .and_then(Value::as_mapping)
            .and_then(|g| g.get("format"))
        {
            Some(Value::Null) | None => None,
            Some(raw) => Some(FormatConfig::from_yaml(raw)?),
        };
        generation.remove("format");

        Ok(Self {
            entries,
            generation,
            format,
            routing: optional_section(root, "routing")?,
            meta: optional_section(root, "meta")?,
        })
    }

    /// Resolve against `store` with an entropy-seeded macro evaluator.
    pub fn prepare(self, store: &TemplateStore) -> Result<PreparedRequest> {
        self.prepare_with(&mut MessageAssembler::new(store))
    }

    pub fn prepare_with<R: Rng>(
        self,
        assembler: &mut MessageAssembler<'_, R>,
    ) -> Result<PreparedRequest> {
        let conversation = assembler.assemble(&self.entries)?;
        let mut meta = self.meta;
        meta.entry("trace_id")
            .or_insert_with(|| serde_json::Value::String(uuid::Uuid::new_v4().to_string()));
        Ok(PreparedRequest {
            conversation,
            generation: self.generation,
            format: self.format,
            routing: self.routing,
            meta,
            warnings: assembler.take_warnings(),
        })
    }
}

fn invalid(path: impl Into<String>, msg: impl Into<String>) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(path)
            .with_source("document"),
    )
}

fn optional_section(root: &Mapping, key: &str) -> Result<JsonMap> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(JsonMap::new()),
        Some(value @ Value::Mapping(_)) => match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(invalid(key, format!("{} must be a mapping", key))),
            Err(e) => Err(invalid(key, format!("{} is not JSON-compatible: {}", key, e))),
        },
        Some(_) => Err(invalid(key, format!("{} must be a mapping", key))),
    }
}

fn parse_entry(idx: usize, item: &Value) -> Result<Entry> {
    let at = format!("messages[{}]", idx);
    let map = item
        .as_mapping()
        .ok_or_else(|| invalid(at.clone(), "message entries must be mappings"))?;

    if let Some(reference) = reference_of(map) {
        return reference.map(Entry::Reference).map_err(|msg| {
            Error::invalid_reference(
                msg,
                ErrorContext::new()
                    .with_field_path(at.clone())
                    .with_source("document"),
            )
        });
    }

    if map.contains_key("images") {
        return parse_image_entry(&at, map);
    }

    let (role_key, content) = if let (Some(role), Some(content)) = (map.get("role"), map.get("content")) {
        if map.len() != 2 {
            return Err(invalid(at, "role/content entries take no other keys"));
        }
        (yaml_key(role), content)
    } else if map.len() == 1 {
        match map.iter().next() {
            Some((key, content)) => (yaml_key(key), content),
            None => return Err(invalid(at, "empty message entry")),
        }
    } else {
        return Err(invalid(
            at,
            "message entries need role/content, a single role key, or images",
        ));
    };

    let role = parse_role(&at, &role_key)?;
    let content = content_text(&at, content)?;
    if role != MessageRole::System && content.is_empty() {
        return Err(invalid(at, format!("{} message must not be empty", role)));
    }
    Ok(Entry::Message(LiteralMessage {
        role,
        content,
        attachments: Vec::new(),
    }))
}

fn parse_image_entry(at: &str, map: &Mapping) -> Result<Entry> {
    let others: Vec<(&Value, &Value)> = map
        .iter()
        .filter(|(key, _)| yaml_key(key) != "images")
        .collect();

    let (role, content) = if map.contains_key("role") || map.contains_key("content") {
        match (map.get("role"), map.get("content")) {
            (Some(role), Some(content)) if others.len() == 2 => {
                (parse_role(at, &yaml_key(role))?, content_text(at, content)?)
            }
            _ => {
                return Err(invalid(
                    at,
                    "role/content entries take both keys and no others besides images",
                ))
            }
        }
    } else {
        match others.as_slice() {
            [] => (MessageRole::User, String::new()),
            [(key, content)] => (parse_role(at, &yaml_key(key))?, content_text(at, content)?),
            _ => {
                return Err(invalid(
                    at,
                    "image entries take a single role key besides images",
                ))
            }
        }
    };

    let urls = match map.get("images") {
        Some(Value::Sequence(items)) => items,
        Some(Value::Mapping(m)) => match m.get("urls") {
            Some(Value::Sequence(items)) => items,
            None => return Err(invalid(at, "images mapping needs a 'urls' list")),
            Some(_) => return Err(invalid(at, "images.urls must be a list")),
        },
        _ => return Err(invalid(at, "images must be a list of paths or a mapping with urls")),
    };
    let attachments = urls
        .iter()
        .map(|u| {
            u.as_str()
                .map(|s| Attachment::new(s.trim()))
                .ok_or_else(|| invalid(at, "image paths must be strings"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Entry::Message(LiteralMessage {
        role,
        content,
        attachments,
    }))
}

fn parse_legacy_messages(map: &Mapping) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for (key, value) in map.iter() {
        let key = yaml_key(key);
        let at = format!("messages.{}", key);
        let role = parse_role(&at, &key)?;
        let values: Vec<&Value> = match value {
            Value::Sequence(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in values {
            let content = content_text(&at, value)?;
            if content.is_empty() {
                if role == MessageRole::System {
                    continue;
                }
                return Err(invalid(at, format!("{} message must not be empty", role)));
            }
            entries.push(Entry::message(role, content));
        }
    }
    Ok(entries)
}

fn parse_role(at: &str, key: &str) -> Result<MessageRole> {
    MessageRole::parse_key(key).map_err(|_| {
        Error::invalid_role(
            key,
            ErrorContext::new()
                .with_field_path(at)
                .with_source("document"),
        )
    })
}

fn content_text(at: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| invalid(at, "message content must be a string"))
}
