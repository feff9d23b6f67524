//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for interacting with various LLM providers:
//! - **Ollama**: Local LLM inference (default, mirrors the `llama3.2` setup)
//! - **OpenAI**: OpenAI API and compatible endpoints such as LM Studio

use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
///
/// | Provider | Feature | Notes |
/// |----------|---------|-------|
/// | Ollama | `ollama` | Recommended for local |
/// | OpenAI | `openai` | Any `/chat/completions` compatible server |
#[derive(Debug, Clone)]
pub enum Provider {
    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    /// };
    /// ```
    Ollama { base_url: String, model: String },

    /// OpenAI-compatible chat completions provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "lm-studio".to_string(),
    ///     api_base: "http://localhost:1234/v1".to_string(),
    ///     model: "qwen2.5-7b-instruct".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's feature is disabled or the
    /// configuration is invalid.
    pub async fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            #[allow(unreachable_patterns)]
            other => Err(AppError::LLM(format!(
                "{} provider is not enabled in this build",
                other.name()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama { .. } => "Ollama",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }

    /// Model identifier requested from the provider
    pub fn model(&self) -> &str {
        match self {
            Provider::Ollama { model, .. } | Provider::OpenAI { model, .. } => model,
        }
    }
}
