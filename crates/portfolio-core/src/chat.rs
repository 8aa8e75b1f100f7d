//! Conversation controller for the portfolio chat panel.
//!
//! A submit is split in two. [`ConversationController::submit`] runs
//! synchronously: it validates the input, appends the user turn, raises the
//! in-flight flag and builds the provider request. The returned
//! [`PendingExchange`] performs the single provider call and appends either
//! the reply or [`FALLBACK_REPLY`]. Front ends can run it inline or on a
//! spawned task.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::content::ContentRecord;
use crate::error::ChatError;
use crate::prompt::prompt_variables;
use crate::provider::{CompletionProvider, CompletionRequest, WireMessage, WireRole};
use crate::scene::{ChatConfig, Scene};
use crate::state::{ChatMessage, ConversationState};

pub const FALLBACK_REPLY: &str = "I'm having trouble connecting right now. Please try again later.";

/// Canned prompts offered while the transcript is empty.
pub const QUICK_REPLIES: [&str; 3] = [
    "Tell me about his skills",
    "Show me his projects",
    "Download resume",
];

#[derive(Debug, Default)]
struct Inner {
    state: ConversationState,
    /// Bumped on reset so replies from an older session are dropped.
    epoch: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of the synchronous half of a submit.
#[derive(Debug)]
pub enum Submission {
    /// Input was empty after trimming.
    Empty,
    /// Another exchange is still outstanding.
    Busy,
    Pending(PendingExchange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Ignored,
    Replied,
    Fallback,
    /// The transcript was reset while the call was outstanding.
    Discarded,
}

#[derive(Clone)]
pub struct ConversationController {
    inner: Arc<Mutex<Inner>>,
    config: Arc<ChatConfig>,
    content: Arc<ContentRecord>,
    scene: String,
}

impl ConversationController {
    pub fn new(config: Arc<ChatConfig>, content: Arc<ContentRecord>, scene: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            config,
            content,
            scene: scene.into(),
        }
    }

    /// Seed the transcript, e.g. from a saved history file.
    pub fn with_history(self, messages: Vec<ChatMessage>) -> Self {
        lock(&self.inner).state.messages = messages;
        self
    }

    pub fn scene_name(&self) -> &str {
        &self.scene
    }

    pub fn snapshot(&self) -> ConversationState {
        lock(&self.inner).state.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.inner).state.messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner).state.in_flight
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner).state.visible
    }

    pub fn toggle(&self) -> bool {
        let mut inner = lock(&self.inner);
        inner.state.visible = !inner.state.visible;
        inner.state.visible
    }

    pub fn open(&self) {
        lock(&self.inner).state.visible = true;
    }

    pub fn close(&self) {
        lock(&self.inner).state.visible = false;
    }

    /// Clear the transcript. An outstanding call still completes, but its
    /// reply is discarded.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        inner.state.messages.clear();
        inner.epoch += 1;
        tracing::debug!(epoch = inner.epoch, "chat transcript reset");
    }

    pub fn submit(&self, text: &str) -> Result<Submission, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Submission::Empty);
        }

        let (history, epoch) = {
            let mut inner = lock(&self.inner);
            if inner.state.in_flight {
                tracing::debug!("submit ignored, exchange already in flight");
                return Ok(Submission::Busy);
            }
            let history = inner.state.messages.clone();
            inner.state.messages.push(ChatMessage::user(text));
            inner.state.in_flight = true;
            (history, inner.epoch)
        };

        let Some(scene) = self.config.scene(&self.scene) else {
            tracing::error!(scene = %self.scene, "chat scene configuration not found");
            lock(&self.inner).state.in_flight = false;
            return Err(ChatError::SceneNotConfigured(self.scene.clone()));
        };

        let request = build_request(scene, &self.content, &history, text);
        tracing::debug!(
            scene = %self.scene,
            provider = scene.provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        Ok(Submission::Pending(PendingExchange {
            inner: Arc::clone(&self.inner),
            provider: Arc::clone(&scene.provider),
            request,
            epoch,
        }))
    }

    /// Submit and wait for the exchange to finish.
    pub async fn send(&self, text: &str) -> Result<ExchangeOutcome, ChatError> {
        match self.submit(text)? {
            Submission::Pending(exchange) => Ok(exchange.run().await),
            Submission::Empty | Submission::Busy => Ok(ExchangeOutcome::Ignored),
        }
    }
}

/// One outstanding provider call.
pub struct PendingExchange {
    inner: Arc<Mutex<Inner>>,
    provider: Arc<dyn CompletionProvider>,
    request: CompletionRequest,
    epoch: u64,
}

impl std::fmt::Debug for PendingExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingExchange")
            .field("provider", &self.provider.name())
            .field("request", &self.request)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl PendingExchange {
    pub async fn run(self) -> ExchangeOutcome {
        let PendingExchange { inner, provider, request, epoch } = self;
        let result = provider.complete(request).await;
        finish(&inner, epoch, result)
    }
}

fn finish(inner: &Mutex<Inner>, epoch: u64, result: anyhow::Result<String>) -> ExchangeOutcome {
    let mut inner = lock(inner);
    inner.state.in_flight = false;

    if inner.epoch != epoch {
        match &result {
            Ok(_) => tracing::debug!("discarding reply for a reset transcript"),
            Err(err) => tracing::debug!(error = %format!("{err:#}"), "discarding failed exchange for a reset transcript"),
        }
        return ExchangeOutcome::Discarded;
    }

    match result {
        Ok(text) => {
            inner.state.messages.push(ChatMessage::assistant(text));
            ExchangeOutcome::Replied
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "chat conversation failed");
            inner.state.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
            ExchangeOutcome::Fallback
        }
    }
}

/// Outbound form of a transcript entry: unrecognised roles go out as `user`
/// and content is flattened to text.
pub fn normalize(message: &ChatMessage) -> WireMessage {
    WireMessage::new(message.role.into(), message.text().into_owned())
}

fn build_request(
    scene: &Scene,
    content: &ContentRecord,
    history: &[ChatMessage],
    text: &str,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);

    if let Some(generator) = &scene.system_prompt {
        let preamble = generator(&prompt_variables(content));
        if !preamble.is_empty() {
            messages.push(WireMessage::new(WireRole::System, preamble));
        }
    }
    messages.extend(history.iter().map(normalize));
    messages.push(WireMessage::new(WireRole::User, text));

    CompletionRequest {
        model: scene.settings.model().to_string(),
        messages,
        temperature: scene.settings.temperature(),
        max_tokens: scene.settings.max_tokens(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SceneSettings, DEFAULT_SCENE};
    use crate::prompt::{template_generator, DEFAULT_SYSTEM_PROMPT};
    use crate::state::{ChatRole, MessageContent};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Replies with a fixed text and records every request.
    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(req);
            Ok("He works mostly on frontend and UI/UX.".to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _req: CompletionRequest) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("OpenAI API error 500: upstream exploded"))
        }
    }

    /// Blocks until released so tests can act while a call is outstanding.
    #[derive(Default)]
    struct GatedProvider {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CompletionProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn complete(&self, _req: CompletionRequest) -> anyhow::Result<String> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("late reply".to_string())
        }
    }

    fn controller_with(scene: Scene) -> ConversationController {
        let config = ChatConfig::new().with_scene(DEFAULT_SCENE, scene);
        ConversationController::new(
            Arc::new(config),
            Arc::new(ContentRecord::builtin().clone()),
            DEFAULT_SCENE,
        )
    }

    fn recording() -> (Arc<RecordingProvider>, ConversationController) {
        let provider = Arc::new(RecordingProvider::default());
        let controller = controller_with(Scene::new(provider.clone()));
        (provider, controller)
    }

    fn expect_pending(submission: Submission) -> PendingExchange {
        match submission {
            Submission::Pending(exchange) => exchange,
            other => panic!("expected pending exchange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let (provider, controller) = recording();

        assert!(matches!(controller.submit("").unwrap(), Submission::Empty));
        assert!(matches!(controller.submit("   \n\t").unwrap(), Submission::Empty));
        assert_eq!(controller.send("").await.unwrap(), ExchangeOutcome::Ignored);

        assert!(controller.messages().is_empty());
        assert!(!controller.is_loading());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn user_turn_is_visible_before_reply() {
        let (_provider, controller) = recording();

        let exchange = expect_pending(controller.submit("  hi  ").unwrap());
        let state = controller.snapshot();
        assert_eq!(state.messages, vec![ChatMessage::user("hi")]);
        assert!(state.in_flight);

        assert_eq!(exchange.run().await, ExchangeOutcome::Replied);
        let state = controller.snapshot();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role, ChatRole::Assistant);
        assert!(!state.in_flight);
    }

    #[tokio::test]
    async fn submit_while_in_flight_is_a_no_op() {
        let (provider, controller) = recording();

        let exchange = expect_pending(controller.submit("hi").unwrap());
        let before = controller.snapshot();

        assert!(matches!(controller.submit("there").unwrap(), Submission::Busy));
        assert_eq!(controller.snapshot(), before);

        exchange.run().await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn each_success_adds_user_then_assistant() {
        let (provider, controller) = recording();

        controller.send("first").await.unwrap();
        controller.send("second").await.unwrap();

        let roles: Vec<ChatRole> = controller.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn failure_appends_fixed_fallback() {
        let controller = controller_with(Scene::new(Arc::new(FailingProvider)));

        let outcome = controller.send("hi").await.unwrap();
        let messages = controller.messages();

        assert_eq!(outcome, ExchangeOutcome::Fallback);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::assistant(FALLBACK_REPLY));
        assert!(!messages[1].text().contains("exploded"));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn request_order_and_defaults() {
        let provider = Arc::new(RecordingProvider::default());
        let controller = controller_with(
            Scene::new(provider.clone()).with_system_prompt(template_generator("SYS")),
        );

        controller.send("one").await.unwrap();
        controller.send("two").await.unwrap();

        let req = provider.last();
        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 4000);

        let sent: Vec<(WireRole, &str)> =
            req.messages.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            sent,
            vec![
                (WireRole::System, "SYS"),
                (WireRole::User, "one"),
                (WireRole::Assistant, "He works mostly on frontend and UI/UX."),
                (WireRole::User, "two"),
            ]
        );
    }

    #[tokio::test]
    async fn scene_overrides_reach_request() {
        let provider = Arc::new(RecordingProvider::default());
        let settings = SceneSettings {
            model: Some("llama3.2".to_string()),
            temperature: Some(0.1),
            max_tokens: Some(256),
            ..SceneSettings::default()
        };
        let controller = controller_with(Scene::new(provider.clone()).with_settings(settings));

        controller.send("hi").await.unwrap();

        let req = provider.last();
        assert_eq!(req.model, "llama3.2");
        assert_eq!(req.temperature, 0.1);
        assert_eq!(req.max_tokens, 256);
    }

    #[tokio::test]
    async fn empty_preamble_is_omitted() {
        let provider = Arc::new(RecordingProvider::default());
        let controller = controller_with(
            Scene::new(provider.clone()).with_system_prompt(template_generator("{{unset}}")),
        );

        controller.send("hi").await.unwrap();

        let req = provider.last();
        assert_eq!(req.messages, vec![WireMessage::new(WireRole::User, "hi")]);
    }

    #[tokio::test]
    async fn odd_roles_are_coerced_only_outbound() {
        let history: Vec<ChatMessage> = serde_json::from_value(json!([
            { "role": "tool", "content": "tool output" },
            { "content": { "kind": "card", "id": 7 } },
            { "role": "assistant", "content": "earlier reply" },
        ]))
        .unwrap();

        let (provider, controller) = recording();
        let controller = controller.with_history(history.clone());

        controller.send("hi").await.unwrap();

        let req = provider.last();
        assert_eq!(req.messages[0], WireMessage::new(WireRole::User, "tool output"));
        assert_eq!(req.messages[1], WireMessage::new(WireRole::User, r#"{"id":7,"kind":"card"}"#));
        assert_eq!(req.messages[2].role, WireRole::Assistant);

        let local = controller.messages();
        assert_eq!(&local[..3], &history[..]);
        assert_eq!(local[0].role, ChatRole::Unknown);
        assert!(matches!(local[1].content, MessageContent::Structured(_)));
    }

    #[tokio::test]
    async fn missing_scene_keeps_only_user_turn() {
        let controller = ConversationController::new(
            Arc::new(ChatConfig::new()),
            Arc::new(ContentRecord::builtin().clone()),
            "nowhere",
        );

        let err = controller.submit("hi").unwrap_err();

        assert!(matches!(err, ChatError::SceneNotConfigured(ref s) if s == "nowhere"));
        assert_eq!(controller.messages(), vec![ChatMessage::user("hi")]);
        assert!(!controller.is_loading());
        assert!(controller.send("again").await.is_err());
        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn second_submit_during_call_is_dropped() {
        let provider = Arc::new(GatedProvider::default());
        let controller = controller_with(Scene::new(provider.clone()));

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send("hi").await })
        };
        provider.started.notified().await;

        assert_eq!(controller.send("there").await.unwrap(), ExchangeOutcome::Ignored);

        provider.release.notify_one();
        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(outcome, ExchangeOutcome::Replied);
        let messages = controller.messages();
        assert_eq!(messages, vec![ChatMessage::user("hi"), ChatMessage::assistant("late reply")]);
    }

    #[tokio::test]
    async fn reset_discards_late_reply() {
        let provider = Arc::new(GatedProvider::default());
        let controller = controller_with(Scene::new(provider.clone()));

        let exchange = expect_pending(controller.submit("hi").unwrap());
        let task = tokio::spawn(exchange.run());
        provider.started.notified().await;

        controller.reset();
        assert!(controller.messages().is_empty());
        assert!(controller.is_loading());

        provider.release.notify_one();
        assert_eq!(task.await.unwrap(), ExchangeOutcome::Discarded);
        assert!(controller.messages().is_empty());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn toggle_leaves_transcript_alone() {
        let (_provider, controller) = recording();
        controller.send("hi").await.unwrap();
        let before = controller.messages();

        assert!(controller.toggle());
        assert!(controller.is_open());
        assert!(!controller.toggle());
        controller.open();
        controller.close();

        assert!(!controller.is_open());
        assert_eq!(controller.messages(), before);
    }

    #[tokio::test]
    async fn reply_after_close_still_lands() {
        let (_provider, controller) = recording();
        controller.open();

        let exchange = expect_pending(controller.submit("hi").unwrap());
        controller.close();
        exchange.run().await;

        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn skills_question_gets_portfolio_preamble() {
        let provider = Arc::new(RecordingProvider::default());
        let controller = controller_with(
            Scene::new(provider.clone()).with_system_prompt(template_generator(DEFAULT_SYSTEM_PROMPT)),
        );

        controller.send(QUICK_REPLIES[0]).await.unwrap();

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::user("Tell me about his skills"));
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert!(!messages[1].text().is_empty());

        let req = provider.last();
        assert_eq!(req.messages[0].role, WireRole::System);
        assert!(req.messages[0].content.contains("Graphic Designing"));
    }
}
