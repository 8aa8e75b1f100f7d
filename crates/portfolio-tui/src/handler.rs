use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, Section};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_chat_task().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Sections
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_section(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.prev_section(),

        // Scrolling in the focused pane
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),

        KeyCode::Char('c') => app.toggle_chat(),

        _ if app.chat.is_open() => handle_chat_normal(app, key),

        KeyCode::Char(c @ '1'..='6') => select_section_by_digit(app, c),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.toggle_chat(),
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('r') => app.reset_chat(),
        KeyCode::Char('w') => {
            app.focus = match app.focus {
                FocusPane::Content => FocusPane::Chat,
                FocusPane::Chat => FocusPane::Content,
            };
        }
        KeyCode::Char(c @ '1'..='3') if app.focus == FocusPane::Chat && app.quick_replies_visible() => {
            app.send_quick_reply(digit(c) - 1);
        }
        KeyCode::Char(c @ '1'..='6') => select_section_by_digit(app, c),
        _ => {}
    }
}

fn digit(c: char) -> usize {
    c.to_digit(10).unwrap_or(0) as usize
}

fn select_section_by_digit(app: &mut App, c: char) {
    if let Some(section) = digit(c).checked_sub(1).and_then(|i| Section::ALL.get(i)) {
        app.select_section(*section);
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_chat_input();
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.chat_cursor < app.chat_input.chars().count() {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            app.chat_cursor = (app.chat_cursor + 1).min(app.chat_input.chars().count());
        }
        KeyCode::Home => app.chat_cursor = 0,
        KeyCode::End => app.chat_cursor = app.chat_input.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let over = |area: Option<Rect>| area.is_some_and(|r| point_in_rect(mouse.column, mouse.row, r));

    let pane = if over(app.chat_area) {
        Some(FocusPane::Chat)
    } else if over(app.content_area) {
        Some(FocusPane::Content)
    } else {
        None
    };

    let Some(pane) = pane else { return };

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.focus = pane;
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.focus = pane;
            app.scroll_up();
        }
        MouseEventKind::Down(_) => app.focus = pane,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use portfolio_core::{
        ChatConfig, ChatMessage, ChatRole, CompletionProvider, CompletionRequest, ContentRecord,
        ConversationController, Scene,
    };

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
            let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("echo: {last}"))
        }
    }

    fn app(config: ChatConfig) -> App {
        let content = Arc::new(ContentRecord::builtin().clone());
        let chat = ConversationController::new(Arc::new(config), content.clone(), "portfolio_assistant");
        App::new(content, chat)
    }

    fn echo_app() -> App {
        app(ChatConfig::new().with_scene("portfolio_assistant", Scene::new(Arc::new(EchoProvider))))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn wait_for_reply(app: &mut App) {
        if let Some(task) = app.chat_task.take() {
            task.await.unwrap();
        }
    }

    #[test]
    fn utf8_cursor_editing() {
        let mut app = app(ChatConfig::new());
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "héllo");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.chat_input, "hélo");
        assert_eq!(app.chat_cursor, 3);

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.chat_input, "élo");
    }

    #[test]
    fn digits_select_sections_when_chat_closed() {
        let mut app = app(ChatConfig::new());
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.section, Section::Projects);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.section, Section::Experience);
    }

    #[tokio::test]
    async fn enter_sends_message_and_reply_lands() {
        let mut app = echo_app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "hi there");
        press(&mut app, KeyCode::Enter);

        assert!(app.chat_input.is_empty());
        assert_eq!(app.input_mode, InputMode::Normal);
        wait_for_reply(&mut app).await;

        let messages = app.chat.messages();
        assert_eq!(messages[0], ChatMessage::user("hi there"));
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].text(), "echo: hi there");
    }

    #[tokio::test]
    async fn quick_reply_digit_submits_fixed_text() {
        let mut app = echo_app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('1'));
        wait_for_reply(&mut app).await;

        let messages = app.chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::user("Tell me about his skills"));
        // quick replies hide once the transcript has content, so digits switch sections again
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.section, Section::About);
        assert_eq!(app.chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn reset_key_clears_transcript() {
        let mut app = echo_app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('3'));
        wait_for_reply(&mut app).await;

        press(&mut app, KeyCode::Char('r'));
        assert!(app.chat.messages().is_empty());
    }

    #[test]
    fn mouse_scroll_targets_pane_under_cursor() {
        let mut app = app(ChatConfig::new());
        app.content_area = Some(Rect::new(0, 0, 50, 20));
        app.chat_area = Some(Rect::new(50, 0, 30, 20));

        handle_mouse(&mut app, MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 60,
            row: 5,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(app.focus, FocusPane::Chat);
        assert_eq!(app.chat_scroll, 1);

        handle_mouse(&mut app, MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(app.content_scroll, 1);
    }
}
