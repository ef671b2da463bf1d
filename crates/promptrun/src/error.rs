//! Error types for promptrun

use thiserror::Error;

/// Prompt execution error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (empty provider key, malformed prompts file)
    #[error("configuration error: {0}")]
    Config(String),

    /// No prompt definition with the requested name
    #[error("prompt not found: {0}")]
    PromptNotFound(String),

    /// No client registered for the requested provider
    #[error("no client registered for provider '{0}'")]
    ProviderUnavailable(String),

    /// Request invalid by construction (missing variables, streaming a
    /// structured prompt)
    #[error("validation error: {0}")]
    Validation(String),

    /// Tools requested against a client without tool support
    #[error("client '{model}' does not support {origin} tools")]
    ToolsUnsupported {
        /// Model identifier of the rejecting client
        model: String,
        /// Where the rejected tools came from: "requested" for a per-call
        /// override, "configured" for the prompt definition
        origin: String,
    },

    /// Failure raised by a provider client, passed through unchanged
    #[error("provider call failed: {0}")]
    Provider(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
