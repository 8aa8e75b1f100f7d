use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::ChatRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Ollama,
    Claude,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Ollama => "ollama",
            Provider::Claude => "claude",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "ollama" => Some(Provider::Ollama),
            "claude" => Some(Provider::Claude),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
            Provider::Claude => "https://api.anthropic.com",
        }
    }

    /// Environment variable consulted when a scene has no API key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Ollama => None,
            Provider::Claude => Some("ANTHROPIC_API_KEY"),
        }
    }
}

/// Roles a completion endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    User,
    Assistant,
}

impl WireRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireRole::System => "system",
            WireRole::User => "user",
            WireRole::Assistant => "assistant",
        }
    }
}

impl From<ChatRole> for WireRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::Assistant => WireRole::Assistant,
            ChatRole::System => WireRole::System,
            ChatRole::User | ChatRole::Unknown => WireRole::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: WireRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A backend that turns a message list into a single reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for status display and logs.
    fn name(&self) -> &str;

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String>;
}
