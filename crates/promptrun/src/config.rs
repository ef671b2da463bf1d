//! Prompt definition and model configuration types
//!
//! A prompt definition pairs a named template with the model configuration it
//! targets. Rendering substitutes `{{variable}}` placeholders and returns the
//! key-sorted variable map that later feeds cache-key derivation.

use crate::error::{Error, Result};
use crate::tools::ToolSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

lazy_static::lazy_static! {
    static ref PLACEHOLDER: regex::Regex =
        regex::Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
            .expect("placeholder pattern is valid");
}

fn default_temperature() -> f32 {
    0.7
}

/// Target model configuration for a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider identifier (e.g. "openai", "anthropic")
    pub provider: String,
    /// Model identifier (provider-specific)
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Whether the prompt expects structured output (never streamable)
    #[serde(default)]
    pub structured: bool,
    /// Tools configured for this prompt
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

/// Tool entry as it appears in a prompts file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name
    pub name: String,
    /// Tool description
    #[serde(default)]
    pub description: String,
    /// JSON schema for parameters
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Discriminator for remote tool resolution
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Endpoint for remote tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ToolConfig {
    /// Convert the configured entry into the spec handed to clients
    #[must_use]
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            kind: self.kind.clone(),
            url: self.url.clone(),
        }
    }
}

/// Named prompt template bound to a model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt name
    pub name: String,
    /// Template body with `{{variable}}` placeholders
    pub template: String,
    /// Target model configuration
    pub model: ModelConfig,
}

impl PromptDefinition {
    /// Create a prompt definition
    #[must_use]
    pub fn new(name: impl Into<String>, template: impl Into<String>, model: ModelConfig) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            model,
        }
    }

    /// Check the structural invariants of the definition
    ///
    /// # Errors
    /// Returns `Error::Config` when `provider` or `model` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.model.provider.trim().is_empty() {
            return Err(Error::Config(format!(
                "prompt '{}' has an empty provider",
                self.name
            )));
        }
        if self.model.model.trim().is_empty() {
            return Err(Error::Config(format!(
                "prompt '{}' has an empty model",
                self.name
            )));
        }
        Ok(())
    }

    /// Render the template against caller-supplied variables
    ///
    /// Returns the rendered prompt text together with the normalized
    /// (key-sorted) variable map. Variables without a matching placeholder
    /// are kept in the normalized map.
    ///
    /// # Errors
    /// Returns `Error::Validation` naming every placeholder that has no
    /// matching variable.
    pub fn render_with(
        &self,
        variables: &HashMap<String, String>,
    ) -> Result<(String, BTreeMap<String, String>)> {
        let normalized: BTreeMap<String, String> = variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut missing: Vec<String> = Vec::new();
        let rendered = PLACEHOLDER.replace_all(&self.template, |caps: &regex::Captures<'_>| {
            let variable = &caps[1];
            match normalized.get(variable) {
                Some(value) => value.clone(),
                None => {
                    if !missing.iter().any(|m| m == variable) {
                        missing.push(variable.to_string());
                    }
                    String::new()
                }
            }
        });

        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "prompt '{}' is missing variables: {}",
                self.name,
                missing.join(", ")
            )));
        }

        Ok((rendered.into_owned(), normalized))
    }

    /// Build the tool specifications configured for this prompt
    #[must_use]
    pub fn build_tools(&self) -> Vec<ToolSpec> {
        self.model.tools.iter().map(ToolConfig::to_spec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(template: &str) -> PromptDefinition {
        PromptDefinition::new(
            "greet",
            template,
            ModelConfig {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                structured: false,
                tools: Vec::new(),
            },
        )
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let def = definition("Hello, {{name}}!");
        let vars = HashMap::from([("name".to_string(), "Ada".to_string())]);

        let (rendered, normalized) = def.render_with(&vars).unwrap();
        assert_eq!(rendered, "Hello, Ada!");
        assert_eq!(normalized.get("name").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn test_render_tolerates_placeholder_whitespace() {
        let def = definition("Hello, {{ name }}!");
        let vars = HashMap::from([("name".to_string(), "Ada".to_string())]);

        let (rendered, _) = def.render_with(&vars).unwrap();
        assert_eq!(rendered, "Hello, Ada!");
    }

    #[test]
    fn test_render_missing_variable() {
        let def = definition("{{greeting}}, {{name}}!");
        let vars = HashMap::from([("greeting".to_string(), "Hi".to_string())]);

        let err = def.render_with(&vars).unwrap_err();
        match err {
            Error::Validation(message) => assert!(message.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_render_keeps_extra_variables() {
        let def = definition("Hello, {{name}}!");
        let vars = HashMap::from([
            ("name".to_string(), "Ada".to_string()),
            ("unused".to_string(), "x".to_string()),
        ]);

        let (_, normalized) = def.render_with(&vars).unwrap();
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_normalized_variables_are_key_sorted() {
        let def = definition("{{a}}{{b}}{{c}}");
        let vars = HashMap::from([
            ("c".to_string(), "3".to_string()),
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);

        let (_, normalized) = def.render_with(&vars).unwrap();
        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_validate_rejects_empty_provider() {
        let mut def = definition("x");
        def.model.provider = "  ".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut def = definition("x");
        def.model.model = String::new();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_build_tools_maps_config_entries() {
        let mut def = definition("x");
        def.model.tools = vec![ToolConfig {
            name: "search".to_string(),
            description: "Web search".to_string(),
            parameters: serde_json::json!({"type": "object"}),
            kind: Some("remote".to_string()),
            url: Some("https://tools.example.com".to_string()),
        }];

        let tools = def.build_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search");
        assert_eq!(tools[0].kind.as_deref(), Some("remote"));
    }
}
