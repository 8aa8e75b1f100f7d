//! UI-agnostic chat state types
//!
//! These are shared between the controller and whatever front end renders the
//! transcript. Messages deserialize leniently so a replayed history with odd
//! roles or structured content still loads.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

/// A chat message in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: ChatRole,
    #[serde(default)]
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.content.as_text()
    }
}

/// The role of a chat message sender
///
/// Anything other than the three roles a provider accepts is kept as
/// `Unknown` so the local transcript shows what was actually loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    #[default]
    Unknown,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
            ChatRole::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "user" => ChatRole::User,
            "assistant" => ChatRole::Assistant,
            "system" => ChatRole::System,
            _ => ChatRole::Unknown,
        }
    }
}

impl From<String> for ChatRole {
    fn from(s: String) -> Self {
        ChatRole::from_str(&s)
    }
}

impl From<ChatRole> for String {
    fn from(role: ChatRole) -> Self {
        role.as_str().to_string()
    }
}

/// Any role value that is not one of the known strings, `null` and numbers
/// included, loads as `Unknown`.
fn lenient_role<'de, D>(deserializer: D) -> Result<ChatRole, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(role)) => ChatRole::from_str(&role),
        _ => ChatRole::Unknown,
    })
}

/// Message body: plain text, or any other JSON value a history file carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(serde_json::Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Text as sent to a provider; structured values are serialized compactly.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            MessageContent::Text(text) => Cow::Borrowed(text),
            MessageContent::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}

/// Snapshot of everything the chat panel renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub in_flight: bool,
    pub visible: bool,
}
