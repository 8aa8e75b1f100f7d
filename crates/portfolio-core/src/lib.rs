pub mod ai;
pub mod chat;
pub mod config;
pub mod content;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod scene;
pub mod state;

// Re-export main types for convenience
pub use ai::{ClaudeClient, OllamaClient, OpenAIClient};
pub use chat::{ConversationController, ExchangeOutcome, PendingExchange, Submission, FALLBACK_REPLY, QUICK_REPLIES};
pub use config::{Config, SceneSettings};
pub use content::ContentRecord;
pub use error::ChatError;
pub use prompt::PromptGenerator;
pub use provider::{CompletionProvider, CompletionRequest, Provider, WireMessage, WireRole};
pub use scene::{ChatConfig, Scene};
pub use state::{ChatMessage, ChatRole, ConversationState, MessageContent};
