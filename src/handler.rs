use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::outside_click::point_in_rect;
use crate::tui::AppEvent;
use crate::widget::Focus;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => app.on_reply(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            // Launcher shortcut
            KeyCode::Char('o') => {
                app.widget.toggle();
                return;
            }
            _ => {}
        }
    }
    if key.code == KeyCode::F(2) {
        app.widget.toggle();
        return;
    }

    if !app.widget.is_open() {
        handle_closed(app, key);
        return;
    }

    match key.code {
        KeyCode::Esc => app.widget.close(),
        KeyCode::Tab | KeyCode::BackTab => app.widget.cycle_focus(),
        KeyCode::PageUp => app.widget.scroll_up(5),
        KeyCode::PageDown => app.widget.scroll_down(5),
        _ => match app.widget.focus() {
            Focus::Input => handle_input(app, key),
            Focus::Menu => handle_menu(app, key),
        },
    }
}

fn handle_closed(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char(' ') => app.widget.open(),
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.send_draft(),
        KeyCode::Backspace => app.widget.backspace(),
        KeyCode::Delete => app.widget.delete(),
        KeyCode::Left => app.widget.cursor_left(),
        KeyCode::Right => app.widget.cursor_right(),
        KeyCode::Home => app.widget.cursor_home(),
        KeyCode::End => app.widget.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.widget.insert_char(c);
        }
        _ => {}
    }
}

fn handle_menu(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Char('l') | KeyCode::Down | KeyCode::Right => {
            app.widget.menu_next();
        }
        KeyCode::Char('k') | KeyCode::Char('h') | KeyCode::Up | KeyCode::Left => {
            app.widget.menu_prev();
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let index = app.widget.menu_cursor();
            app.activate_menu_item(index);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<ratatui::layout::Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(button) => {
            // The launcher owns clicks on itself
            if hit(app.regions.launcher) {
                if button == MouseButton::Left {
                    app.widget.toggle();
                }
                return;
            }
            if !app.widget.is_open() {
                return;
            }
            if app.widget.pointer_down(x, y, app.regions.dialog, app.regions.launcher) {
                return;
            }
            if button != MouseButton::Left {
                return;
            }

            let menu_hit = app
                .regions
                .menu
                .iter()
                .find(|(area, _)| point_in_rect(x, y, *area))
                .map(|(_, index)| *index);
            if let Some(index) = menu_hit {
                app.activate_menu_item(index);
            } else if hit(app.regions.send_button) {
                app.send_draft();
            } else if hit(app.regions.input) {
                app.widget.focus_input();
            }
        }
        MouseEventKind::ScrollUp if hit(app.regions.messages) => app.widget.scroll_up(3),
        MouseEventKind::ScrollDown if hit(app.regions.messages) => app.widget.scroll_down(3),
        _ => {}
    }
}
