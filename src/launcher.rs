use ratatui::style::{Color, Modifier, Style};

/// Floating bubble that opens and closes the dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Launcher;

/// How the bubble looks for a given open state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherLook {
    pub label: &'static str,
    pub style: Style,
}

impl Launcher {
    pub fn toggle(&self, open: &mut bool) {
        *open = !*open;
    }

    pub fn look(&self, open: bool) -> LauncherLook {
        if open {
            LauncherLook {
                label: " ✕ ",
                style: Style::default().bg(Color::Blue).fg(Color::White),
            }
        } else {
            LauncherLook {
                label: " 💬 ",
                style: Style::default()
                    .bg(Color::LightBlue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            }
        }
    }
}
