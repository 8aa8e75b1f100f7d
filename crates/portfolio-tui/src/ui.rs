use portfolio_core::{ChatRole, ContentRecord, QUICK_REPLIES};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

use crate::app::{App, FocusPane, InputMode, Section};

/// Style `**bold**` runs; an unmatched `**` is kept literally.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An even number of parts means the last `**` never closed.
    let unclosed = parts.len() % 2 == 0;

    let mut spans = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        if i % 2 == 1 && !(unclosed && is_last) {
            spans.push(Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD)));
        } else if unclosed && is_last {
            spans.push(Span::raw(format!("**{part}")));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);

    if app.chat.is_open() {
        let [content_area, chat_area] = Layout::horizontal([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .areas(body_area);
        render_section(app, frame, content_area);
        render_chat(app, frame, chat_area);
    } else {
        app.chat_area = None;
        render_section(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let personal = &app.content.personal;
    let title = Line::from(vec![
        Span::styled(format!(" {} ", personal.name), Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("· {} ", personal.role), Style::default().fg(Color::White)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title).style(Style::default().bg(Color::DarkGray)), area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i + 1, s.title()));

    let tabs = Tabs::new(titles)
        .select(app.section.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("│");

    frame.render_widget(tabs, area);
}

fn render_section(app: &mut App, frame: &mut Frame, area: Rect) {
    app.content_area = Some(area);

    let focused = app.focus == FocusPane::Content || !app.chat.is_open();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.section.title()));

    let text = section_text(&app.content, app.section);
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn muted(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

pub fn section_text(content: &ContentRecord, section: Section) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    match section {
        Section::Hero => {
            let personal = &content.personal;
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                personal.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(personal.role.clone()));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                personal.tagline.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::default());
            lines.push(Line::from(muted(personal.highlights.join(" · "))));
            lines.push(Line::default());
            lines.push(Line::from(muted("Press c to chat with the portfolio assistant")));
        }
        Section::About => {
            for paragraph in content.about.bio.split("\n\n") {
                lines.push(Line::from(paragraph.to_string()));
                lines.push(Line::default());
            }
        }
        Section::Skills => {
            for skill in &content.skills {
                lines.push(Line::from(Span::styled(
                    skill.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("  {}", skill.description)));
                lines.push(Line::default());
            }
        }
        Section::Projects => {
            for category in &content.projects {
                lines.push(heading(category.category.clone()));
                lines.push(Line::default());
                for project in &category.items {
                    lines.push(Line::from(Span::styled(
                        project.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(format!("  {}", project.description)));
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(project.tools.join(", "), Style::default().fg(Color::Yellow)),
                    ]));
                    lines.push(Line::default());
                }
            }
        }
        Section::Experience => {
            for entry in &content.experience {
                lines.push(Line::from(Span::styled(
                    entry.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("  {}", entry.description)));
                lines.push(Line::default());
            }
        }
        Section::Contact => {
            let personal = &content.personal;
            let rows = [
                ("Email", &personal.email),
                ("Phone", &personal.phone),
                ("GitHub", &personal.social.github),
                ("LinkedIn", &personal.social.linkedin),
                ("Facebook", &personal.social.facebook),
            ];
            for (label, value) in rows {
                lines.push(Line::from(vec![
                    Span::styled(format!("{label:<10}"), Style::default().fg(Color::Cyan)),
                    Span::raw(value.clone()),
                ]));
            }
        }
    }

    Text::from(lines)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let state = app.chat.snapshot();
    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" REN-AI Assistant · {} ", app.chat.scene_name()));

    let mut lines: Vec<Line> = Vec::new();

    if state.messages.is_empty() && !state.in_flight {
        lines.push(Line::from(muted("Ask me anything about the portfolio!")));
        lines.push(Line::default());
        for (i, suggestion) in QUICK_REPLIES.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(format!(" \"{suggestion}\"")),
            ]));
        }
    }

    for msg in &state.messages {
        let (label, color) = match msg.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
            ChatRole::System => ("System:", Color::Magenta),
            ChatRole::Unknown => ("?:", Color::DarkGray),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));

        let text = msg.text();
        if msg.role == ChatRole::Assistant {
            lines.extend(text.lines().map(parse_markdown_line));
        } else {
            lines.extend(text.lines().map(|l| Line::from(l.to_string())));
        }
        lines.push(Line::default());
    }

    if state.in_flight {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_chat_input(app, frame, input_area, state.in_flight);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect, in_flight: bool) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if in_flight { " Waiting for reply... " } else { " Message (i to type) " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor inside the box by scrolling the input horizontally.
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.chat_cursor >= inner_width {
        app.chat_cursor - inner_width + 1
    } else {
        0
    };

    let visible: String = app.chat_input.chars().skip(scroll_offset).take(inner_width).collect();
    let placeholder = app.chat_input.is_empty() && !editing;
    let input = if placeholder {
        Paragraph::new(Span::styled("Type your message...", Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (app.chat_cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = if app.input_mode == InputMode::Editing {
        " Enter send · Esc stop typing "
    } else if app.chat.is_open() {
        " i type · 1-3 suggestions · r reset · w switch pane · Esc close "
    } else {
        " Tab/1-6 sections · j/k scroll · c chat · q quit "
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), muted(hints)];
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {status} "), Style::default().fg(Color::Red)));
    } else {
        spans.push(muted(format!(" © {} ", app.content.personal.name)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
