use std::sync::Arc;

use portfolio_core::{
    ChatMessage, ContentRecord, ConversationController, ExchangeOutcome, Submission, QUICK_REPLIES,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hero,
    About,
    Skills,
    Projects,
    Experience,
    Contact,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Hero,
        Section::About,
        Section::Skills,
        Section::Projects,
        Section::Experience,
        Section::Contact,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Hero => "Home",
            Section::About => "About",
            Section::Skills => "Skills",
            Section::Projects => "Projects",
            Section::Experience => "Experience",
            Section::Contact => "Contact",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Content,
    Chat,
}

pub struct App {
    pub should_quit: bool,
    pub section: Section,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    pub content: Arc<ContentRecord>,
    pub content_scroll: u16,

    // Chat panel
    pub chat: ConversationController,
    pub chat_task: Option<JoinHandle<ExchangeOutcome>>,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    pub animation_frame: u8,
    /// One-line notice shown in the footer.
    pub status: Option<String>,

    // Last rendered areas, for mouse hit-testing
    pub content_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(content: Arc<ContentRecord>, chat: ConversationController) -> Self {
        Self {
            should_quit: false,
            section: Section::Hero,
            input_mode: InputMode::Normal,
            focus: FocusPane::Content,

            content,
            content_scroll: 0,

            chat,
            chat_task: None,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,
            status: None,

            content_area: None,
            chat_area: None,
        }
    }

    pub fn select_section(&mut self, section: Section) {
        if self.section != section {
            self.section = section;
            self.content_scroll = 0;
        }
    }

    pub fn next_section(&mut self) {
        self.select_section(self.section.next());
    }

    pub fn prev_section(&mut self) {
        self.select_section(self.section.prev());
    }

    pub fn scroll_down(&mut self) {
        match self.focus {
            FocusPane::Content => self.content_scroll = self.content_scroll.saturating_add(1),
            FocusPane::Chat => self.chat_scroll = self.chat_scroll.saturating_add(1),
        }
    }

    pub fn scroll_up(&mut self) {
        match self.focus {
            FocusPane::Content => self.content_scroll = self.content_scroll.saturating_sub(1),
            FocusPane::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(1),
        }
    }

    pub fn toggle_chat(&mut self) {
        if self.chat.toggle() {
            self.focus = FocusPane::Chat;
        } else {
            self.focus = FocusPane::Content;
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn reset_chat(&mut self) {
        self.chat.reset();
        self.chat_scroll = 0;
        self.status = None;
    }

    /// Send the edited input line. The line is only cleared once accepted.
    pub fn submit_chat_input(&mut self) {
        if self.chat_input.trim().is_empty() || self.chat.is_loading() {
            return;
        }
        let text = std::mem::take(&mut self.chat_input);
        self.chat_cursor = 0;
        self.input_mode = InputMode::Normal;
        self.submit_text(&text);
    }

    pub fn send_quick_reply(&mut self, idx: usize) {
        if let Some(text) = QUICK_REPLIES.get(idx) {
            self.submit_text(text);
        }
    }

    pub fn quick_replies_visible(&self) -> bool {
        self.chat.messages().is_empty()
    }

    fn submit_text(&mut self, text: &str) {
        match self.chat.submit(text) {
            Ok(Submission::Pending(exchange)) => {
                self.status = None;
                self.chat_task = Some(tokio::spawn(exchange.run()));
            }
            Ok(Submission::Busy) => {
                self.status = Some("Still waiting for the last reply".to_string());
            }
            Ok(Submission::Empty) => {}
            Err(err) => {
                self.status = Some(format!("Chat unavailable: {err}"));
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Collect a finished chat task, if any.
    pub async fn poll_chat_task(&mut self) {
        let finished = self.chat_task.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.chat_task.take() {
            match task.await {
                Ok(ExchangeOutcome::Fallback) => {
                    self.status = Some("Assistant is unreachable, see the log for details".to_string());
                }
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "chat task failed"),
            }
            self.scroll_chat_to_bottom();
        }
    }

    pub fn tick_animation(&mut self) {
        if self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the chat so the newest message (or the thinking indicator) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 40 };
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };

        let messages = self.chat.messages();
        let mut total_lines = wrapped_line_count(&messages, wrap_width);
        if self.chat.is_loading() {
            total_lines += 2;
        }

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

/// Rendered height of a transcript: a label line, the wrapped body, and a
/// blank separator per message.
fn wrapped_line_count(messages: &[ChatMessage], wrap_width: usize) -> u16 {
    let wrap_width = wrap_width.max(1);
    let mut total: u16 = 0;

    for msg in messages {
        total = total.saturating_add(1);
        for line in msg.text().lines() {
            let chars = line.chars().count();
            let rows = if chars == 0 { 1 } else { chars.div_ceil(wrap_width) };
            total = total.saturating_add(rows as u16);
        }
        total = total.saturating_add(1);
    }

    total
}
