//! Lifecycle hooks around prompt execution
//!
//! Hooks observe an invocation at three points: before the client call, after
//! a successful call, and on client failure. Dispatch is synchronous and in
//! registration order. A panicking hook is deliberately not caught: it aborts
//! the remaining hooks for that call and surfaces to the caller, so failures
//! in observers stay visible instead of being silently swallowed.

use crate::client::LlmResponse;
use crate::config::ModelConfig;
use crate::error::Error;
use crate::tools::ToolSpec;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Immutable snapshot of one invocation, shared across all hook call sites
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Name of the executed prompt
    pub prompt_name: String,
    /// Model configuration of the prompt definition
    pub model: ModelConfig,
    /// Normalized (key-sorted) variables
    pub variables: BTreeMap<String, String>,
    /// Rendered prompt text sent to the client
    pub rendered_prompt: String,
    /// Resolved tool list (`None` when no tools apply)
    pub tools: Option<Vec<ToolSpec>>,
}

/// Trait implemented by hook observers
///
/// All handlers default to no-ops so observers implement only the points
/// they care about.
pub trait PromptHook: Send + Sync {
    /// Called after a plan was built, before the client call
    fn before_run(&self, context: &HookContext) {
        let _ = context;
    }

    /// Called after a successful client call (not on cache hits)
    fn after_run(&self, context: &HookContext, response: &LlmResponse) {
        let _ = (context, response);
    }

    /// Called when the client call fails, before the error propagates
    fn on_error(&self, context: &HookContext, error: &Error) {
        let _ = (context, error);
    }
}

/// Ordered fan-out over registered hook observers
#[derive(Clone, Default)]
pub struct HookDispatcher {
    hooks: Vec<Arc<dyn PromptHook>>,
}

impl HookDispatcher {
    /// Create a dispatcher over the given observers
    #[must_use]
    pub fn new(hooks: Vec<Arc<dyn PromptHook>>) -> Self {
        Self { hooks }
    }

    /// Append an observer
    pub fn push(&mut self, hook: Arc<dyn PromptHook>) {
        self.hooks.push(hook);
    }

    /// Number of registered observers
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no observers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Notify all observers that a call is about to start
    pub fn before_run(&self, context: &HookContext) {
        debug!(prompt = %context.prompt_name, hooks = self.hooks.len(), "dispatching before_run");
        for hook in &self.hooks {
            hook.before_run(context);
        }
    }

    /// Notify all observers of a successful response
    pub fn after_run(&self, context: &HookContext, response: &LlmResponse) {
        debug!(prompt = %context.prompt_name, "dispatching after_run");
        for hook in &self.hooks {
            hook.after_run(context, response);
        }
    }

    /// Notify all observers of a client failure
    pub fn on_error(&self, context: &HookContext, error: &Error) {
        debug!(prompt = %context.prompt_name, %error, "dispatching on_error");
        for hook in &self.hooks {
            hook.on_error(context, error);
        }
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
