//! Response caching keyed by prompt parameters
//!
//! Cache keys are derived from a canonical serialization of the call
//! parameters: fixed field order, key-sorted variables, and temperature
//! rounded to 3 decimal places so float representation noise from client
//! configuration does not fragment the cache.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Serialize)]
struct KeyPayload<'a> {
    prompt: &'a str,
    model: &'a str,
    provider: &'a str,
    temperature: f64,
    variables: &'a BTreeMap<String, String>,
}

/// Return a deterministic cache key for the given call parameters
///
/// Structurally equal arguments produce byte-identical keys regardless of
/// variable insertion order or temperature differences below the third
/// decimal place.
#[must_use]
pub fn build_key(
    prompt: &str,
    model: &str,
    provider: &str,
    temperature: f32,
    variables: &BTreeMap<String, String>,
) -> String {
    let payload = KeyPayload {
        prompt,
        model,
        provider,
        temperature: (f64::from(temperature) * 1000.0).round() / 1000.0,
        variables,
    };
    let encoded =
        serde_json::to_vec(&payload).expect("cache key payload serialization cannot fail");
    format!("{:x}", Sha256::digest(&encoded))
}

/// Trait implemented by cache backends
pub trait PromptCache: Send + Sync {
    /// Return the cached output for a key, if present
    fn get(&self, key: &str) -> Option<String>;

    /// Store (or overwrite) the output for a key
    fn set(&self, key: &str, value: String);
}

/// Process-lifetime in-memory cache; non-evicting, no TTL
#[derive(Debug, Default)]
pub struct MemoryCache {
    store: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().expect("cache lock poisoned").is_empty()
    }
}

impl PromptCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.store.read().expect("cache lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.store
            .write()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_key_is_deterministic() {
        let vars = variables(&[("name", "Ada"), ("tone", "formal")]);
        let a = build_key("greet", "gpt-4o-mini", "openai", 0.2, &vars);
        let b = build_key("greet", "gpt-4o-mini", "openai", 0.2, &vars);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_invariant_under_insertion_order() {
        let forward = variables(&[("a", "1"), ("b", "2")]);
        let reversed = variables(&[("b", "2"), ("a", "1")]);
        assert_eq!(
            build_key("p", "m", "openai", 0.5, &forward),
            build_key("p", "m", "openai", 0.5, &reversed)
        );
    }

    #[test]
    fn test_key_tolerates_sub_millis_temperature_noise() {
        let vars = variables(&[("name", "Ada")]);
        let a = build_key("greet", "m1", "openai", 0.123, &vars);
        let b = build_key("greet", "m1", "openai", 0.123_000_04, &vars);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_beyond_rounding() {
        let vars = variables(&[("name", "Ada")]);
        let a = build_key("greet", "m1", "openai", 0.123, &vars);
        let b = build_key("greet", "m1", "openai", 0.124, &vars);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_depends_on_every_field() {
        let vars = variables(&[("name", "Ada")]);
        let base = build_key("greet", "m1", "openai", 0.0, &vars);

        assert_ne!(base, build_key("other", "m1", "openai", 0.0, &vars));
        assert_ne!(base, build_key("greet", "m2", "openai", 0.0, &vars));
        assert_ne!(base, build_key("greet", "m1", "anthropic", 0.0, &vars));
        assert_ne!(
            base,
            build_key("greet", "m1", "openai", 0.0, &variables(&[("name", "Bob")]))
        );
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = build_key("p", "m", "openai", 0.0, &BTreeMap::new());
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("k").is_none());

        cache.set("k", "v1".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v1"));

        // Overwrite is last-write-wins.
        cache.set("k", "v2".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_sets_to_distinct_keys_lose_no_updates() {
        let cache = std::sync::Arc::new(MemoryCache::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.set(&format!("w{worker}-k{i}"), format!("v{i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8 * 50);
        assert_eq!(cache.get("w0-k0").as_deref(), Some("v0"));
        assert_eq!(cache.get("w7-k49").as_deref(), Some("v49"));
    }

    #[test]
    fn test_concurrent_sets_to_same_key_are_last_write_wins() {
        let cache = std::sync::Arc::new(MemoryCache::new());

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set("shared", format!("worker-{worker}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Never a partial or torn value, always the full write of one worker.
        let value = cache.get("shared").unwrap();
        assert!(value.starts_with("worker-"));
        assert_eq!(cache.len(), 1);
    }
}
