use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

use crate::provider::{CompletionProvider, CompletionRequest, WireMessage, WireRole};

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a WireMessage>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ClaudeClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// The messages API takes system text as a top-level field, not a turn.
fn split_system(messages: &[WireMessage]) -> (Option<String>, Vec<&WireMessage>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == WireRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let turns = messages.iter().filter(|m| m.role != WireRole::System).collect();

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, turns)
}

#[async_trait]
impl CompletionProvider for ClaudeClient {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<String> {
        let (system, messages) = split_system(&req.messages);
        let request = ClaudeRequest {
            model: &req.model,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            system,
            messages,
        };

        let response = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Claude API error {}: {}", status, text));
        }

        let claude_response: ClaudeResponse = response.json().await?;
        claude_response.content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| anyhow!("Claude response contained no content"))
    }
}
