//! Client abstraction for LLM providers
//!
//! Provider adapters (network calls, SDKs) live outside this crate; the
//! orchestrator only consumes this trait.

use crate::error::Result;
use crate::tools::ToolSpec;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Stream of incremental text chunks produced by a client
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Normalized response returned from an LLM client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Free-form reasoning trace (may be empty)
    pub reasoning: String,
    /// Authoritative result text
    pub output: String,
}

impl LlmResponse {
    /// Create a response with reasoning and output
    #[must_use]
    pub fn new(reasoning: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            output: output.into(),
        }
    }

    /// Create a response carrying only output text
    #[must_use]
    pub fn from_output(output: impl Into<String>) -> Self {
        Self {
            reasoning: String::new(),
            output: output.into(),
        }
    }
}

/// Trait implemented by LLM provider adapters
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier this client talks to
    fn model(&self) -> &str;

    /// Sampling temperature the client is configured with
    fn temperature(&self) -> f32;

    /// Whether the client can handle tool/function calling
    fn supports_tools(&self) -> bool;

    /// Return a complete response for the given prompt
    async fn generate(&self, prompt: &str, tools: Option<&[ToolSpec]>) -> Result<LlmResponse>;

    /// Return a stream of text chunks for the given prompt
    ///
    /// The stream may fail mid-sequence; chunks yielded before the failure
    /// are not retracted.
    async fn generate_stream(
        &self,
        prompt: &str,
        tools: Option<&[ToolSpec]>,
    ) -> Result<ChunkStream>;
}

impl std::fmt::Debug for dyn LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("model", &self.model())
            .finish()
    }
}
