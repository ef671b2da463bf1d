//! Promptrun - Prompt Template Orchestration
//!
//! This crate provides the execution layer for LLM-backed applications:
//! - Loader: named prompt templates bound to a target provider, loaded from TOML
//! - Registry: pluggable client abstraction keyed by provider name
//! - Runner: buffered and streaming execution with feature-compatibility checks
//! - Hooks: before/after/error observation around each client call
//! - Cache: deterministic response caching for buffered calls
//!
//! Provider adapters themselves (network calls, SDKs) are out of scope; an
//! application implements [`LlmClient`] for each backend it talks to and
//! registers the instances with a [`PromptRunner`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod registry;
pub mod runner;
pub mod tools;

pub use cache::{build_key, MemoryCache, PromptCache};
pub use client::{ChunkStream, LlmClient, LlmResponse};
pub use config::{ModelConfig, PromptDefinition, ToolConfig};
pub use error::{Error, Result};
pub use hooks::{HookContext, HookDispatcher, PromptHook};
pub use loader::PromptLoader;
pub use registry::ClientRegistry;
pub use runner::{PromptRunner, PromptStream, RunRequest};
pub use tools::ToolSpec;
