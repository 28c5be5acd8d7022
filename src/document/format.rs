//! Output format hints carried alongside the conversation

use crate::{Error, ErrorContext, Result};
use serde::Serialize;
use serde_yaml::Value;

const SUPPORTED: &[&str] = &["json", "json_schema", "markdown", "text"];

/// Requested response format, forwarded untouched to the provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatConfig {
    Text,
    Markdown,
    Json,
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

impl FormatConfig {
    /// Parse `generation.format`: either a type string or a mapping with `type`.
    pub fn from_yaml(raw: &Value) -> Result<Self> {
        let invalid = |msg: String| {
            Error::validation_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path("generation.format")
                    .with_source("document"),
            )
        };

        if let Some(s) = raw.as_str() {
            let ty = s.trim().to_lowercase();
            if ty.is_empty() {
                return Err(invalid("format must not be empty".to_string()));
            }
            return match ty.as_str() {
                "text" => Ok(FormatConfig::Text),
                "markdown" => Ok(FormatConfig::Markdown),
                "json" => Ok(FormatConfig::Json),
                "json_schema" => Err(invalid(
                    "json_schema format needs a mapping with name and schema".to_string(),
                )),
                other => Err(invalid(format!(
                    "unsupported format '{}', expected one of: {}",
                    other,
                    SUPPORTED.join(", ")
                ))),
            };
        }

        let map = raw
            .as_mapping()
            .ok_or_else(|| invalid("format must be a string or a mapping".to_string()))?;
        let ty = match map.get("type") {
            None | Some(Value::Null) => "text".to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => "text".to_string(),
            Some(Value::String(s)) => s.trim().to_lowercase(),
            Some(_) => return Err(invalid("format.type must be a string".to_string())),
        };

        match ty.as_str() {
            "text" => Ok(FormatConfig::Text),
            "markdown" => Ok(FormatConfig::Markdown),
            "json" => Ok(FormatConfig::Json),
            "json_schema" => {
                let name = map
                    .get("name")
                    .or_else(|| map.get("schema_name"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| invalid("json_schema format requires a name".to_string()))?;
                let schema = map
                    .get("schema")
                    .filter(|v| v.is_mapping())
                    .ok_or_else(|| {
                        invalid("json_schema format requires a schema mapping".to_string())
                    })?;
                let schema = serde_json::to_value(schema)
                    .map_err(|e| invalid(format!("schema is not JSON-compatible: {}", e)))?;
                Ok(FormatConfig::JsonSchema {
                    name: name.trim().to_string(),
                    schema,
                })
            }
            other => Err(invalid(format!(
                "unsupported format type '{}', expected one of: {}",
                other,
                SUPPORTED.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(FormatConfig::from_yaml(&yaml("JSON")).unwrap(), FormatConfig::Json);
        assert_eq!(
            FormatConfig::from_yaml(&yaml("markdown")).unwrap(),
            FormatConfig::Markdown
        );
        assert!(FormatConfig::from_yaml(&yaml("xml")).is_err());
        assert!(FormatConfig::from_yaml(&yaml("''")).is_err());
    }

    #[test]
    fn test_mapping_defaults_to_text() {
        assert_eq!(
            FormatConfig::from_yaml(&yaml("{}")).unwrap(),
            FormatConfig::Text
        );
    }

    #[test]
    fn test_json_schema() {
        let cfg = FormatConfig::from_yaml(&yaml(
            "type: json_schema\nschema_name: answer\nschema:\n  type: object\n",
        ))
        .unwrap();
        assert_eq!(
            cfg,
            FormatConfig::JsonSchema {
                name: "answer".into(),
                schema: json!({"type": "object"})
            }
        );
        assert_eq!(
            serde_json::to_value(&cfg).unwrap(),
            json!({"type": "json_schema", "name": "answer", "schema": {"type": "object"}})
        );
        assert!(FormatConfig::from_yaml(&yaml("type: json_schema\nname: x\n")).is_err());
    }
}
