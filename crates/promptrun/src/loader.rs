//! Prompt TOML loader
//!
//! Loads a prompts file into validated [`PromptDefinition`]s. Format:
//!
//! ```toml
//! [prompts.greet]
//! template = "Hello, {{name}}!"
//!
//! [prompts.greet.model]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! temperature = 0.0
//! ```

use crate::config::{ModelConfig, PromptDefinition};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct PromptsFile {
    #[serde(default)]
    prompts: HashMap<String, PromptEntry>,
}

#[derive(Debug, Deserialize)]
struct PromptEntry {
    template: String,
    model: ModelConfig,
}

/// Read-only source of prompt definitions
#[derive(Debug, Default)]
pub struct PromptLoader {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptLoader {
    /// Load prompt definitions from a TOML file
    ///
    /// # Errors
    /// - File read failure
    /// - TOML parse failure
    /// - Definition with an empty provider or model
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {path:?}: {e}")))?;

        let file: PromptsFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {path:?}: {e}")))?;

        let definitions = file
            .prompts
            .into_iter()
            .map(|(name, entry)| PromptDefinition::new(name, entry.template, entry.model));

        let loader = Self::from_definitions(definitions)?;
        info!("loaded {} prompts from {:?}", loader.len(), path);
        Ok(loader)
    }

    /// Build a loader from in-memory definitions
    ///
    /// # Errors
    /// Returns `Error::Config` when any definition fails validation.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = PromptDefinition>,
    ) -> Result<Self> {
        let mut prompts = HashMap::new();
        for definition in definitions {
            definition.validate()?;
            debug!(prompt = %definition.name, provider = %definition.model.provider, "registered prompt");
            prompts.insert(definition.name.clone(), definition);
        }
        Ok(Self { prompts })
    }

    /// Look up a prompt definition by name
    ///
    /// # Errors
    /// Returns `Error::PromptNotFound` when no definition matches.
    pub fn get(&self, name: &str) -> Result<&PromptDefinition> {
        self.prompts
            .get(name)
            .ok_or_else(|| Error::PromptNotFound(name.to_string()))
    }

    /// Return the sorted list of known prompt names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.prompts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of loaded definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the loader holds no definitions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
