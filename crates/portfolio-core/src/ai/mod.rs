pub mod claude;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::Result;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use crate::config::SceneSettings;
use crate::provider::{CompletionProvider, Provider};

/// Build the HTTP client a scene's settings point at.
pub fn client_for(settings: &SceneSettings) -> Result<Arc<dyn CompletionProvider>> {
    let base_url = settings.base_url();
    let timeout = settings.timeout();

    let api_key = match settings.provider.api_key_env() {
        Some(var) => settings.resolve_api_key().unwrap_or_else(|| {
            tracing::warn!(
                provider = settings.provider.as_str(),
                "no API key configured and {} is unset",
                var
            );
            String::new()
        }),
        None => String::new(),
    };

    let client: Arc<dyn CompletionProvider> = match settings.provider {
        Provider::OpenAI => Arc::new(OpenAIClient::new(base_url, &api_key, timeout)?),
        Provider::Ollama => Arc::new(OllamaClient::new(base_url, timeout)?),
        Provider::Claude => Arc::new(ClaudeClient::new(base_url, &api_key, timeout)?),
    };
    Ok(client)
}
