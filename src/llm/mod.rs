//! Language model client abstraction.
//!
//! The reasoning loop only needs "send these messages, get text back", so the
//! trait is kept that narrow. [`OpenAiClient`] talks to any OpenAI-compatible
//! chat completions endpoint.

mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::LlmConfig;
use crate::error::ResearchError;

pub use openai::OpenAiClient;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Caller-supplied API key.
///
/// Formatting never reveals the secret; use [`Credential::expose`] at the
/// single place where it goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    /// SHA-256 of the secret, hex encoded. Safe to use as a cache key component.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.expose().as_bytes()))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Chat completion backend used by the reasoning loop.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Settings this client was built with.
    fn config(&self) -> &LlmConfig;

    /// Run one completion and return the assistant text.
    ///
    /// Generation stops before any of the `stop` sequences.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        stop: &[String],
    ) -> Result<String, ResearchError>;
}
