//! Prompt execution orchestration
//!
//! The runner resolves a prompt definition, renders it, picks the registered
//! client, derives a cache key, and sequences lifecycle hooks around the
//! client call. Buffered runs consult the response cache; streaming runs
//! forward chunks as they arrive and never touch the cache.

use crate::cache::{self, MemoryCache, PromptCache};
use crate::client::{ChunkStream, LlmClient, LlmResponse};
use crate::config::PromptDefinition;
use crate::error::{Error, Result};
use crate::hooks::{HookContext, HookDispatcher, PromptHook};
use crate::loader::PromptLoader;
use crate::registry::ClientRegistry;
use crate::tools::ToolSpec;
use futures::stream::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, instrument};

/// One prompt invocation, built with the request builder API
///
/// `tools` distinguishes "no override" (`None`) from "override with an empty
/// list" (`Some(vec![])`): the latter suppresses the definition's configured
/// tools for this call.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Name of the prompt definition to execute
    pub prompt_name: String,
    /// Caller-supplied template variables
    pub variables: HashMap<String, String>,
    /// Per-call tool override
    pub tools: Option<Vec<ToolSpec>>,
    /// Whether the response cache participates in this call
    pub use_cache: bool,
}

impl RunRequest {
    /// Create a request for the named prompt
    #[must_use]
    pub fn new(prompt_name: impl Into<String>) -> Self {
        Self {
            prompt_name: prompt_name.into(),
            variables: HashMap::new(),
            tools: None,
            use_cache: true,
        }
    }

    /// Add a template variable
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Add template variables
    #[must_use]
    pub fn with_variables(
        mut self,
        variables: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Override the tool list for this call
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Skip the response cache for this call
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Fully-resolved description of one invocation
///
/// Built once per call and never mutated afterwards, so the cache key, the
/// rendered text sent to the client, and the hook context stay consistent
/// with each other. The source definition and the normalized variables are
/// held by the `context` snapshot rather than duplicated here.
struct ExecutionPlan {
    cache_key: Option<String>,
    context: Arc<HookContext>,
    client: Arc<dyn LlmClient>,
    rendered_prompt: String,
    tools: Option<Vec<ToolSpec>>,
}

/// High-level orchestrator that renders and executes prompts
pub struct PromptRunner {
    loader: PromptLoader,
    registry: ClientRegistry,
    cache: Arc<dyn PromptCache>,
    hooks: HookDispatcher,
}

impl PromptRunner {
    /// Create a runner bound to a prompt loader, with an in-memory cache and
    /// no hooks
    #[must_use]
    pub fn new(loader: PromptLoader) -> Self {
        Self {
            loader,
            registry: ClientRegistry::new(),
            cache: Arc::new(MemoryCache::new()),
            hooks: HookDispatcher::default(),
        }
    }

    /// Replace the cache backend
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn PromptCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Append a hook observer
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PromptHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Associate a client with a provider key
    ///
    /// # Errors
    /// Returns `Error::Config` when the normalized key is empty.
    pub fn register_client(&self, provider: &str, client: Arc<dyn LlmClient>) -> Result<()> {
        self.registry.register(provider, client)
    }

    /// Return the prompt loader backing this runner
    #[must_use]
    pub fn loader(&self) -> &PromptLoader {
        &self.loader
    }

    /// Execute a prompt and return its buffered output
    ///
    /// Hook sequence: `before_run` fires once the plan is built; on a cache
    /// hit the cached output is returned with no further hooks; on success
    /// the cache is written (when enabled) strictly before `after_run`; on
    /// client failure `on_error` fires and the error propagates unchanged.
    ///
    /// # Errors
    /// Plan-build failures (unknown prompt, missing variables, unknown
    /// provider, unsupported tools) surface before any hook fires.
    #[instrument(skip(self, request), fields(prompt = %request.prompt_name))]
    pub async fn run(&self, request: RunRequest) -> Result<String> {
        let plan = self.build_plan(&request, false)?;

        self.hooks.before_run(&plan.context);

        if request.use_cache {
            if let Some(key) = &plan.cache_key {
                if let Some(cached) = self.cache.get(key) {
                    debug!(key = %key, "cache hit");
                    return Ok(cached);
                }
            }
        }

        let response = match plan
            .client
            .generate(&plan.rendered_prompt, plan.tools.as_deref())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.hooks.on_error(&plan.context, &err);
                return Err(err);
            }
        };

        let output = response.output.clone();
        if request.use_cache {
            if let Some(key) = &plan.cache_key {
                self.cache.set(key, output.clone());
            }
        }

        self.hooks.after_run(&plan.context, &response);
        Ok(output)
    }

    /// Execute a prompt and stream its output chunks
    ///
    /// The plan is built with streaming enabled, so structured prompts are
    /// rejected up front. `before_run` fires before the client stream is
    /// opened; the returned stream fires `after_run` once on exhaustion with
    /// the concatenated output, or `on_error` at the point of failure.
    /// Streaming results are never cached.
    ///
    /// # Errors
    /// Plan-build failures surface before any hook fires; a failure opening
    /// the client stream fires `on_error` and propagates.
    #[instrument(skip(self, request), fields(prompt = %request.prompt_name))]
    pub async fn run_stream(&self, request: RunRequest) -> Result<PromptStream> {
        let plan = self.build_plan(&request, true)?;

        self.hooks.before_run(&plan.context);

        let inner = match plan
            .client
            .generate_stream(&plan.rendered_prompt, plan.tools.as_deref())
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                self.hooks.on_error(&plan.context, &err);
                return Err(err);
            }
        };

        Ok(PromptStream {
            inner,
            context: plan.context,
            hooks: self.hooks.clone(),
            collected: String::new(),
            done: false,
        })
    }

    fn build_plan(&self, request: &RunRequest, streaming: bool) -> Result<ExecutionPlan> {
        let definition = self.loader.get(&request.prompt_name)?;

        if streaming && definition.model.structured {
            return Err(Error::Validation(
                "streaming is not supported for structured prompts".to_string(),
            ));
        }

        let (rendered_prompt, variables) = definition.render_with(&request.variables)?;
        let client = self.registry.resolve(&definition.model.provider)?;
        let tools = Self::resolve_tools(definition, client.as_ref(), request.tools.as_ref())?;

        let cache_key = if streaming {
            None
        } else {
            Some(cache::build_key(
                &request.prompt_name,
                client.model(),
                &definition.model.provider,
                client.temperature(),
                &variables,
            ))
        };

        let context = Arc::new(HookContext {
            prompt_name: request.prompt_name.clone(),
            model: definition.model.clone(),
            variables,
            rendered_prompt: rendered_prompt.clone(),
            tools: tools.clone(),
        });

        Ok(ExecutionPlan {
            cache_key,
            context,
            client,
            rendered_prompt,
            tools,
        })
    }

    /// Resolve the effective tool list: an explicit override wins (including
    /// an empty one), but never bypasses the client capability check
    fn resolve_tools(
        definition: &PromptDefinition,
        client: &dyn LlmClient,
        override_tools: Option<&Vec<ToolSpec>>,
    ) -> Result<Option<Vec<ToolSpec>>> {
        if let Some(tools) = override_tools {
            if !tools.is_empty() && !client.supports_tools() {
                return Err(Error::ToolsUnsupported {
                    model: client.model().to_string(),
                    origin: "requested".to_string(),
                });
            }
            return Ok(Some(tools.clone()));
        }

        let configured = definition.build_tools();
        if configured.is_empty() {
            return Ok(None);
        }
        if !client.supports_tools() {
            return Err(Error::ToolsUnsupported {
                model: client.model().to_string(),
                origin: "configured".to_string(),
            });
        }
        Ok(Some(configured))
    }
}

impl std::fmt::Debug for PromptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRunner")
            .field("prompts", &self.loader.len())
            .field("registry", &self.registry)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Lazy, finite, non-restartable stream of output chunks
///
/// Each chunk is forwarded to the consumer as soon as the client yields it
/// and appended to an internal accumulator. On exhaustion `after_run` fires
/// exactly once with the concatenated output and an empty reasoning trace;
/// on mid-stream failure `on_error` fires and the error is yielded in place
/// (chunks already yielded stand). Dropping the stream early fires nothing.
pub struct PromptStream {
    inner: ChunkStream,
    context: Arc<HookContext>,
    hooks: HookDispatcher,
    collected: String,
    done: bool,
}

impl Stream for PromptStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.collected.push_str(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.done = true;
                this.hooks.on_error(&this.context, &err);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.done = true;
                let response = LlmResponse {
                    reasoning: String::new(),
                    output: std::mem::take(&mut this.collected),
                };
                this.hooks.after_run(&this.context, &response);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for PromptStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStream")
            .field("prompt", &self.context.prompt_name)
            .field("done", &self.done)
            .finish()
    }
}
