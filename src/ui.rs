use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::conversation::Sender;
use crate::role::Role;
use crate::widget::{Focus, MenuItem};

const LAUNCHER_WIDTH: u16 = 6;
const LAUNCHER_HEIGHT: u16 = 3;
const DIALOG_WIDTH: u16 = 48;
const DIALOG_HEIGHT: u16 = 26;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Host page: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_backdrop(frame, body_area);
    render_footer(app, frame, footer_area);

    let launcher_area = launcher_rect(body_area);
    app.regions.launcher = Some(launcher_area);

    if app.widget.is_open() {
        let dialog_area = dialog_rect(body_area, launcher_area);
        app.regions.dialog = Some(dialog_area);
        render_dialog(app, frame, dialog_area);
    } else {
        app.regions.dialog = None;
        app.regions.messages = None;
        app.regions.input = None;
        app.regions.send_button = None;
        app.regions.menu.clear();
    }

    render_launcher(app, frame, launcher_area);
}

/// Bottom-right corner of the page body
pub fn launcher_rect(body: Rect) -> Rect {
    let width = LAUNCHER_WIDTH.min(body.width);
    let height = LAUNCHER_HEIGHT.min(body.height);
    Rect::new(
        body.right().saturating_sub(width + 2).max(body.x),
        body.bottom().saturating_sub(height).max(body.y),
        width,
        height,
    )
}

/// Right-aligned with the launcher, sitting just above it
pub fn dialog_rect(body: Rect, launcher: Rect) -> Rect {
    let width = DIALOG_WIDTH.min(body.width.saturating_sub(2));
    let room_above = launcher.y.saturating_sub(body.y);
    let height = DIALOG_HEIGHT.min(room_above);
    Rect::new(
        launcher.right().saturating_sub(width).max(body.x),
        launcher.y.saturating_sub(height),
        width,
        height,
    )
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" DTE EMIS ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.endpoint), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_backdrop(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Directorate of Technical Education",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Education Management Information System"),
        Line::default(),
        Line::from(Span::styled(
            "Need help? Open the chat bubble in the corner.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let backdrop = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(backdrop, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = if !app.widget.is_open() {
        " Enter/F2 open chat | q quit "
    } else if app.widget.focus() == Focus::Menu {
        " ←/→ choose | Enter select | Tab input | Esc close "
    } else {
        " Enter send | Tab questions | PgUp/PgDn scroll | Esc close "
    };

    let footer = Paragraph::new(Line::from(hints))
        .style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(footer, area);
}

fn render_launcher(app: &App, frame: &mut Frame, area: Rect) {
    let look = app.widget.launcher().look(app.widget.is_open());

    frame.render_widget(Clear, area);
    let bubble = Paragraph::new(look.label)
        .alignment(Alignment::Center)
        .style(look.style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(look.style),
        );
    frame.render_widget(bubble, area);
}

fn render_dialog(app: &mut App, frame: &mut Frame, area: Rect) {
    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Blue))
        .title(Span::styled(" Chat with us ", Style::default().fg(Color::White).bg(Color::Blue).bold()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items = app.widget.menu_items();
    let labels: Vec<String> = items.iter().map(button_label).collect();
    let button_rows = layout_buttons(&labels, inner.width);
    let menu_rows = button_rows.iter().map(|b| b.y + 1).max().unwrap_or(0);
    let menu_height = if items.is_empty() { 0 } else { menu_rows + 2 };

    let [menu_area, messages_area, input_area] = Layout::vertical([
        Constraint::Length(menu_height),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(inner);

    render_menu(app, frame, menu_area, &items, &labels, &button_rows);
    render_messages(app, frame, messages_area);
    render_input(app, frame, input_area);
}

fn button_label(item: &MenuItem) -> String {
    format!("[ {} ]", item.label())
}

/// Flow buttons left to right, wrapping like inline boxes. Returned rects
/// are relative to the menu's origin.
pub fn layout_buttons(labels: &[String], width: u16) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(labels.len());
    let (mut x, mut y) = (0u16, 0u16);

    for label in labels {
        let w = (label.width().min(u16::MAX as usize) as u16).min(width);
        if x > 0 && x + w > width {
            x = 0;
            y += 1;
        }
        rects.push(Rect::new(x, y, w, 1));
        x += w + 1;
    }
    rects
}

fn render_menu(
    app: &mut App,
    frame: &mut Frame,
    area: Rect,
    items: &[MenuItem],
    labels: &[String],
    buttons: &[Rect],
) {
    app.regions.menu.clear();
    if area.height == 0 {
        return;
    }

    let heading = if !app.widget.role_gating() {
        "Popular questions".to_string()
    } else {
        match app.widget.role() {
            None => "Who are you?".to_string(),
            Some(role) => format!("Questions for {}", role_heading(role)),
        }
    };
    frame.render_widget(
        Paragraph::new(Span::styled(heading, Style::default().fg(Color::Blue).bold())),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let loading = app.widget.is_loading();
    let menu_focused = app.widget.focus() == Focus::Menu;

    for (index, ((item, label), rel)) in items.iter().zip(labels).zip(buttons).enumerate() {
        let rect = Rect::new(area.x + rel.x, area.y + 1 + rel.y, rel.width, 1);
        if rect.bottom() > area.bottom() {
            break;
        }

        let style = if loading {
            Style::default().fg(Color::DarkGray)
        } else if menu_focused && index == app.widget.menu_cursor() {
            Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
        } else if matches!(item, MenuItem::ChangeRole) {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::LightBlue)
        };

        let text = truncate_to_width(label, rect.width as usize);
        frame.render_widget(Paragraph::new(text).style(style), rect);
        app.regions.menu.push((rect, index));
    }
}

fn role_heading(role: Role) -> &'static str {
    match role {
        Role::Student => "students",
        Role::Teacher => "teachers",
        Role::Parent => "parents",
        Role::General => "everyone",
    }
}

/// Word-wrap `text` to `width` columns, hard-splitting words that don't fit
/// Longest prefix of `text` that fits in `width` terminal columns
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for c in text.chars() {
        let cw = c.width().unwrap_or(0);
        if used + cw > width {
            break;
        }
        out.push(c);
        used += cw;
    }
    out
}

/// Word-wrap measured in terminal columns, so wide glyphs take two cells.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for raw in text.lines() {
        let mut line = String::new();
        let mut len = 0usize;

        for word in raw.split_whitespace() {
            let word_len = word.width();
            if len > 0 && len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if word_len > width {
                for c in word.chars() {
                    let cw = c.width().unwrap_or(0);
                    if len > 0 && len + cw > width {
                        out.push(std::mem::take(&mut line));
                        len = 0;
                    }
                    line.push(c);
                    len += cw;
                }
                continue;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.push_str(word);
            len += word_len;
        }
        out.push(line);
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    app.regions.messages = Some(area);

    let conversation = app.widget.conversation();
    let loading = app.widget.is_loading();

    if conversation.is_empty() && !loading {
        let greeting = Paragraph::new(Line::from(Span::styled(
            app.widget.greeting().to_string(),
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(greeting, area);
        app.widget.sync_scroll(0, area.height);
        return;
    }

    // Bubbles take at most 80% of the width
    let bubble_width = ((area.width as usize) * 4 / 5).max(1);
    let mut lines: Vec<Line> = Vec::new();

    for msg in conversation.messages() {
        let (label, label_style, text_style, alignment) = match msg.sender() {
            Sender::User => (
                "You",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Cyan),
                Alignment::Right,
            ),
            Sender::Bot => (
                "Assistant",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                Style::default(),
                Alignment::Left,
            ),
        };

        lines.push(
            Line::from(vec![
                Span::styled(label, label_style),
                Span::styled(format!(" {}", msg.short_time()), Style::default().fg(Color::DarkGray)),
            ])
            .alignment(alignment),
        );
        for wrapped in wrap_text(msg.text(), bubble_width) {
            lines.push(Line::from(Span::styled(wrapped, text_style)).alignment(alignment));
        }
        lines.push(Line::default());
    }

    if loading {
        lines.push(Line::from(Span::styled(
            "Assistant",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = lines.len().min(u16::MAX as usize) as u16;
    let offset = app.widget.sync_scroll(total_lines, area.height);

    let chat = Paragraph::new(Text::from(lines)).scroll((offset, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(6),
    ])
    .areas(area);
    app.regions.input = Some(input_area);
    app.regions.send_button = Some(button_area);

    let loading = app.widget.is_loading();
    let focused = app.widget.focus() == Focus::Input;
    let border_color = if loading {
        Color::DarkGray
    } else if focused {
        Color::Yellow
    } else {
        Color::Gray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.widget.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.widget.draft().is_empty() {
        Paragraph::new(Span::styled("Type a message...", Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = app
            .widget
            .draft()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), input_area);

    let button_style = if app.widget.can_send() {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new("➤")
        .alignment(Alignment::Center)
        .style(button_style)
        .block(Block::default().borders(Borders::ALL).border_style(button_style));
    frame.render_widget(button, button_area);

    // Show cursor while the input is usable
    if focused && !loading && inner_width > 0 {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::pipeline::tests::ScriptedBackend;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.width() <= 10));
    }

    #[test]
    fn test_wrap_text_splits_long_words_and_keeps_empty() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 5), vec![String::new()]);
        assert_eq!(wrap_text("a\n\nb", 5), vec!["a", "", "b"]);
    }

    #[test]
    fn test_buttons_wrap_to_next_row() {
        let labels: Vec<String> = ["[ aaaa ]", "[ bbbb ]", "[ cc ]"].iter().map(|s| s.to_string()).collect();
        let rects = layout_buttons(&labels, 18);
        assert_eq!(rects[0], Rect::new(0, 0, 8, 1));
        assert_eq!(rects[1], Rect::new(9, 0, 8, 1));
        assert_eq!(rects[2], Rect::new(0, 1, 6, 1));
    }

    #[test]
    fn test_wide_glyphs_measured_in_columns() {
        assert_eq!(wrap_text("你好世界", 4), vec!["你好", "世界"]);
        assert_eq!(wrap_text("你好 世界", 5), vec!["你好", "世界"]);
        assert!(wrap_text("日本語のテキストです", 7).iter().all(|l| l.width() <= 7));

        let labels: Vec<String> = ["[ 🎓 ]", "[ ok ]"].iter().map(|s| s.to_string()).collect();
        let rects = layout_buttons(&labels, 12);
        assert_eq!(rects[0], Rect::new(0, 0, 6, 1));
        assert_eq!(rects[1], Rect::new(0, 1, 6, 1));

        assert_eq!(truncate_to_width("学生 student", 5), "学生 ");
        assert_eq!(truncate_to_width("学生", 3), "学");
    }

    #[test]
    fn test_dialog_sits_above_launcher() {
        let body = Rect::new(0, 1, 100, 40);
        let launcher = launcher_rect(body);
        let dialog = dialog_rect(body, launcher);
        assert_eq!(launcher.bottom(), body.bottom());
        assert_eq!(dialog.bottom(), launcher.y);
        assert_eq!(dialog.right(), launcher.right());
        assert!(dialog.x >= body.x);
    }

    #[test]
    fn test_closed_widget_renders_only_launcher() {
        let (mut app, _rx) = test_app(Arc::new(ScriptedBackend::ok("")));
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        assert!(app.regions.launcher.is_some());
        assert!(app.regions.dialog.is_none());
        assert!(!screen_text(&terminal).contains("Chat with us"));
    }

    #[test]
    fn test_open_dialog_shows_roles_then_teacher_questions() {
        let (mut app, _rx) = test_app(Arc::new(ScriptedBackend::ok("")));
        app.widget.open();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();

        terminal.draw(|f| render(&mut app, f)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Chat with us"));
        assert!(text.contains("Who are you?"));
        assert!(text.contains("Teacher"));
        assert_eq!(app.regions.menu.len(), Role::all().len());

        app.widget.select_role(Role::Teacher);
        terminal.draw(|f| render(&mut app, f)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("How do I update my faculty profile?"));
        // three presets plus "change role"
        assert_eq!(app.regions.menu.len(), 4);
    }

    #[tokio::test]
    async fn test_clicking_rendered_preset_sends_it() {
        let (mut app, _rx) = test_app(Arc::new(ScriptedBackend::ok("")));
        app.widget.open();
        app.widget.select_role(Role::Teacher);
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        let (rect, index) = app.regions.menu[0];
        crate::handler::handle_event(
            &mut app,
            crate::tui::AppEvent::Mouse(crossterm::event::MouseEvent {
                kind: crossterm::event::MouseEventKind::Down(crossterm::event::MouseButton::Left),
                column: rect.x,
                row: rect.y,
                modifiers: crossterm::event::KeyModifiers::NONE,
            }),
        )
        .unwrap();

        assert_eq!(index, 0);
        assert!(app.widget.is_loading());
        assert_eq!(
            app.widget.conversation().messages()[0].text(),
            app.widget.visible_presets()[0]
        );
    }

    #[test]
    fn test_loading_indicator_and_tail_visible() {
        let (mut app, _rx) = test_app(Arc::new(ScriptedBackend::ok("")));
        app.widget.open();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();

        // fill the list well past the viewport, then leave a send in flight
        for i in 0..12 {
            let _pending = app.widget.send(&format!("question {i}")).unwrap();
            app.widget.settle(Ok(format!("answer {i}")));
        }
        let _pending = app.widget.send("last question").unwrap();

        terminal.draw(|f| render(&mut app, f)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Typing."));
        assert!(text.contains("last question"));
        assert!(!text.contains("question 0 "));
        assert!(app.widget.scroll_offset() > 0);
    }
}
