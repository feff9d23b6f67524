//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for interacting with the Large Language
//! Model (LLM) that drives query generation, summarization and reflection.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server
//! - `openai` - OpenAI API and compatible servers (LM Studio, vLLM)

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};
