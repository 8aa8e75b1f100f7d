//! Error types for the chat controller.

/// Errors surfaced to callers of the conversation controller.
///
/// Provider failures never reach the transcript verbatim; they are logged and
/// replaced by the fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("scene '{0}' is not configured")]
    SceneNotConfigured(String),
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::SceneNotConfigured("portfolio_assistant".to_string());
        assert_eq!(err.to_string(), "scene 'portfolio_assistant' is not configured");

        let err = ChatError::Config("bad base url".to_string());
        assert_eq!(err.to_string(), "config error: bad base url");
    }
}
