//! Provider client registry
//!
//! Maps normalized provider names to registered client instances. Shared,
//! process-wide state: registration and resolution are safe to call
//! concurrently.

use crate::client::LlmClient;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Registry of provider clients keyed by normalized provider name
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Arc<dyn LlmClient>>>,
}

impl ClientRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under a provider key
    ///
    /// The key is trimmed and lowercased; registering the same provider twice
    /// silently replaces the earlier client (last-write-wins).
    ///
    /// # Errors
    /// Returns `Error::Config` when the normalized key is empty.
    pub fn register(&self, provider: &str, client: Arc<dyn LlmClient>) -> Result<()> {
        let key = provider.trim().to_lowercase();
        if key.is_empty() {
            return Err(Error::Config(
                "provider key must be a non-empty string".to_string(),
            ));
        }
        debug!(provider = %key, model = client.model(), "registering llm client");
        self.clients
            .write()
            .expect("registry lock poisoned")
            .insert(key, client);
        Ok(())
    }

    /// Resolve the client registered for a provider
    ///
    /// # Errors
    /// Returns `Error::ProviderUnavailable` naming the requested provider
    /// when no client matches.
    pub fn resolve(&self, provider: &str) -> Result<Arc<dyn LlmClient>> {
        let key = provider.trim().to_lowercase();
        self.clients
            .read()
            .expect("registry lock poisoned")
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::ProviderUnavailable(provider.to_string()))
    }

    /// Whether a client is registered for the provider
    #[must_use]
    pub fn contains(&self, provider: &str) -> bool {
        let key = provider.trim().to_lowercase();
        self.clients
            .read()
            .expect("registry lock poisoned")
            .contains_key(&key)
    }

    /// Return the sorted list of registered provider keys
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clients
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
