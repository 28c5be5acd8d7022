//! Preset and group definition structures
//!
//! Definitions are parsed from YAML lists. A preset item is either a single-key
//! `{role: text}` mapping or a `{preset: name}` / `{preset-group: name}` reference.
//! A group item must be a reference.

use crate::types::{MessageRole, TemplateRef};
use crate::{Error, ErrorContext, Result};
use serde_yaml::{Mapping, Value};

const PRESET_KEY: &str = "preset";
const GROUP_KEY: &str = "preset-group";

/// Literal fragment template, before macro expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTemplate {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetItem {
    Template(FragmentTemplate),
    Reference(TemplateRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDefinition {
    pub name: String,
    pub items: Vec<PresetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    pub name: String,
    pub entries: Vec<TemplateRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Preset(PresetDefinition),
    Group(GroupDefinition),
}

impl PresetDefinition {
    pub fn from_yaml(name: &str, value: &Value) -> Result<Self> {
        let list = value.as_sequence().ok_or_else(|| {
            Error::validation_with_context(
                format!("preset '{}' must be a list of messages", name),
                ErrorContext::new()
                    .with_field_path(format!("preset:{}", name))
                    .with_source("definition_parser"),
            )
        })?;

        let mut items = Vec::with_capacity(list.len());
        for (idx, raw) in list.iter().enumerate() {
            let at = || format!("preset:{}[{}]", name, idx + 1);
            let map = raw.as_mapping().ok_or_else(|| {
                Error::validation_with_context(
                    "preset item must be a mapping",
                    ErrorContext::new()
                        .with_field_path(at())
                        .with_source("definition_parser"),
                )
            })?;

            if let Some(reference) = reference_of(map) {
                let reference = reference.map_err(|msg| {
                    Error::validation_with_context(
                        msg,
                        ErrorContext::new()
                            .with_field_path(at())
                            .with_source("definition_parser"),
                    )
                })?;
                items.push(PresetItem::Reference(reference));
                continue;
            }

            if map.len() != 1 {
                return Err(Error::validation_with_context(
                    "preset item must hold exactly one role key, or a preset/preset-group reference",
                    ErrorContext::new()
                        .with_field_path(at())
                        .with_source("definition_parser"),
                ));
            }
            // len() == 1 was checked above
            let Some((key, content)) = map.iter().next() else {
                continue;
            };
            let role_key = yaml_key(key);
            let role = MessageRole::parse_key(&role_key).map_err(|_| {
                Error::invalid_role(
                    role_key.clone(),
                    ErrorContext::new()
                        .with_field_path(at())
                        .with_source("definition_parser"),
                )
            })?;
            let content = content.as_str().ok_or_else(|| {
                Error::validation_with_context(
                    "message content must be a string",
                    ErrorContext::new()
                        .with_field_path(at())
                        .with_source("definition_parser"),
                )
            })?;
            let content = content.trim();
            if role != MessageRole::System && content.is_empty() {
                return Err(Error::validation_with_context(
                    format!("{} message must not be empty", role),
                    ErrorContext::new()
                        .with_field_path(at())
                        .with_source("definition_parser"),
                ));
            }
            items.push(PresetItem::Template(FragmentTemplate {
                role,
                content: content.to_string(),
            }));
        }

        Ok(Self {
            name: name.to_string(),
            items,
        })
    }

    /// Literal templates only, skipping nested references
    pub fn templates(&self) -> impl Iterator<Item = &FragmentTemplate> {
        self.items.iter().filter_map(|item| match item {
            PresetItem::Template(t) => Some(t),
            PresetItem::Reference(_) => None,
        })
    }
}

impl GroupDefinition {
    /// Parse a group body. Every item is checked before the definition is returned,
    /// so a malformed body never yields a partially usable group.
    pub fn from_yaml(name: &str, value: &Value) -> Result<Self> {
        let list = value.as_sequence().ok_or_else(|| {
            Error::invalid_reference(
                format!("group '{}' must be a list of preset/preset-group references", name),
                ErrorContext::new()
                    .with_field_path(format!("group:{}", name))
                    .with_source("definition_parser"),
            )
        })?;

        let mut entries = Vec::with_capacity(list.len());
        for (idx, raw) in list.iter().enumerate() {
            let context = ErrorContext::new()
                .with_field_path(format!("group:{}[{}]", name, idx + 1))
                .with_source("definition_parser");
            let reference = match raw.as_mapping().and_then(reference_of) {
                Some(Ok(reference)) => reference,
                Some(Err(msg)) => return Err(Error::invalid_reference(msg, context)),
                None => {
                    return Err(Error::invalid_reference(
                        "group items must be 'preset' or 'preset-group' references",
                        context.with_details(describe(raw)),
                    ))
                }
            };
            entries.push(reference);
        }

        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }
}

/// `None` when the mapping has no reference key; `Some(Err)` when it is malformed.
pub(crate) fn reference_of(map: &Mapping) -> Option<std::result::Result<TemplateRef, String>> {
    let preset = map.get(PRESET_KEY);
    let group = map.get(GROUP_KEY);
    if preset.is_none() && group.is_none() {
        return None;
    }
    if map.len() != 1 {
        return Some(Err(
            "a reference must contain only one 'preset' or 'preset-group' key".to_string(),
        ));
    }
    let (key, value) = match (preset, group) {
        (Some(v), _) => (PRESET_KEY, v),
        (None, Some(v)) => (GROUP_KEY, v),
        (None, None) => return None,
    };
    let name = match value.as_str().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Some(Err(format!("'{}' value must be a non-empty string", key))),
    };
    Some(Ok(if key == PRESET_KEY {
        TemplateRef::Preset(name)
    } else {
        TemplateRef::Group(name)
    }))
}

pub(crate) fn yaml_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Mapping(map) => {
            let keys: Vec<String> = map.iter().map(|(k, _)| yaml_key(k)).collect();
            format!("found mapping with keys [{}]", keys.join(", "))
        }
        Value::Sequence(_) => "found a list".to_string(),
        Value::String(_) => "found a string".to_string(),
        Value::Null => "found null".to_string(),
        _ => "found a scalar".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_parse_preset_items() {
        let def = PresetDefinition::from_yaml(
            "tutorial",
            &yaml("- system: '  S  '\n- user: Q1\n- assistant: A1\n- preset: style/terse\n"),
        )
        .unwrap();
        assert_eq!(def.items.len(), 4);
        assert_eq!(
            def.items[0],
            PresetItem::Template(FragmentTemplate {
                role: MessageRole::System,
                content: "S".into()
            })
        );
        assert_eq!(
            def.items[3],
            PresetItem::Reference(TemplateRef::preset("style/terse"))
        );
        assert_eq!(def.templates().count(), 3);
    }

    #[test]
    fn test_preset_rejects_unknown_role() {
        let err = PresetDefinition::from_yaml("p", &yaml("- narrator: hi\n")).unwrap_err();
        assert!(matches!(err, Error::InvalidRole { ref role, .. } if role == "narrator"));
    }

    #[test]
    fn test_preset_rejects_empty_user() {
        let err = PresetDefinition::from_yaml("p", &yaml("- user: '   '\n")).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        // empty system text is allowed
        assert!(PresetDefinition::from_yaml("p", &yaml("- system: ''\n")).is_ok());
    }

    #[test]
    fn test_preset_must_be_list() {
        let err = PresetDefinition::from_yaml("p", &yaml("system: hi\n")).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_group_with_literal_is_invalid_reference() {
        let err = GroupDefinition::from_yaml(
            "g",
            &yaml("- preset: a\n- user: hello\n- preset-group: b\n"),
        )
        .unwrap_err();
        match err {
            Error::InvalidReference { context, .. } => {
                assert_eq!(context.field_path.as_deref(), Some("group:g[2]"));
            }
            other => panic!("expected InvalidReference, got {:?}", other),
        }
    }

    #[test]
    fn test_group_reference_value_must_be_string() {
        let err = GroupDefinition::from_yaml("g", &yaml("- preset: [a, b]\n")).unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_group_entries_in_order() {
        let def =
            GroupDefinition::from_yaml("g", &yaml("- preset-group: inner\n- preset: a\n")).unwrap();
        assert_eq!(
            def.entries,
            vec![TemplateRef::group("inner"), TemplateRef::preset("a")]
        );
    }
}
