//! The chat widget's interaction state.
//!
//! Everything one widget instance needs lives in `ChatWidget`: dialog open
//! state, draft, role gate, conversation and the send pipeline. Nothing is
//! shared between instances, and nothing here depends on a terminal.

use ratatui::layout::Rect;
use tracing::debug;

use crate::client::{ChatBackend, ChatError};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::launcher::Launcher;
use crate::outside_click::OutsideClickDetector;
use crate::pipeline::{PendingSend, SendPipeline, SendRejected};
use crate::role::{PresetQuestions, Role, RoleGate};
use crate::scroll::AutoScroll;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Menu,
}

/// One clickable entry above the message list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Role(Role),
    Preset(String),
    ChangeRole,
}

impl MenuItem {
    pub fn label(&self) -> &str {
        match self {
            MenuItem::Role(role) => role.display_name(),
            MenuItem::Preset(question) => question,
            MenuItem::ChangeRole => "↺ Change role",
        }
    }
}

pub struct ChatWidget {
    open: bool,
    launcher: Launcher,
    detector: OutsideClickDetector,

    role_gate: RoleGate,
    role_gating: bool,
    presets: PresetQuestions,

    conversation: Conversation,
    pipeline: SendPipeline,

    // Draft input and cursor (in chars)
    draft: String,
    cursor: usize,

    focus: Focus,
    menu_cursor: usize,
    scroll: AutoScroll,

    greeting: String,
}

impl ChatWidget {
    pub fn new(presets: PresetQuestions, role_gating: bool, greeting: &str) -> Self {
        Self {
            open: false,
            launcher: Launcher,
            detector: OutsideClickDetector::default(),
            role_gate: RoleGate::default(),
            role_gating,
            presets,
            conversation: Conversation::new(),
            pipeline: SendPipeline::new(),
            draft: String::new(),
            cursor: 0,
            focus: Focus::Input,
            menu_cursor: 0,
            scroll: AutoScroll::default(),
            greeting: greeting.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.presets.clone(), config.role_gate, &config.greeting)
    }

    // Read-only views used by the renderer
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn launcher(&self) -> Launcher {
        self.launcher
    }

    pub fn is_loading(&self) -> bool {
        self.pipeline.is_loading()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn role(&self) -> Option<Role> {
        self.role_gate.role()
    }

    pub fn role_gating(&self) -> bool {
        self.role_gating
    }

    /// Send affordance state: something to send and nothing in flight
    pub fn can_send(&self) -> bool {
        !self.is_loading() && !self.draft.trim().is_empty()
    }

    // Dialog lifecycle

    pub fn toggle(&mut self) {
        self.launcher.toggle(&mut self.open);
        self.on_open_changed();
    }

    pub fn open(&mut self) {
        if !self.open {
            self.toggle();
        }
    }

    pub fn close(&mut self) {
        if self.open {
            self.toggle();
        }
    }

    fn on_open_changed(&mut self) {
        if self.open {
            self.detector.attach();
            self.focus = Focus::Input;
        } else {
            self.detector.detach();
        }
        debug!(open = self.open, "dialog toggled");
    }

    /// Pointer-down anywhere on screen. Closes the dialog when the point is
    /// outside both regions; returns whether it did.
    pub fn pointer_down(&mut self, x: u16, y: u16, dialog: Option<Rect>, launcher: Option<Rect>) -> bool {
        if self.open && self.detector.should_close(x, y, dialog, launcher) {
            self.close();
            return true;
        }
        false
    }

    pub fn is_listening_for_outside_clicks(&self) -> bool {
        self.detector.is_attached()
    }

    // Role gate and preset menu

    pub fn select_role(&mut self, role: Role) -> bool {
        if !self.role_gating || self.is_loading() {
            return false;
        }
        let changed = self.role_gate.select(role);
        if changed {
            debug!(role = role.as_str(), "role selected");
            self.menu_cursor = 0;
        }
        changed
    }

    pub fn reset_role(&mut self) {
        if !self.role_gating || self.is_loading() {
            return;
        }
        self.role_gate.reset();
        self.menu_cursor = 0;
    }

    /// Presets visible right now. Empty while the role is unset.
    pub fn visible_presets(&self) -> &[String] {
        if !self.role_gating {
            return self.presets.for_role(Role::General);
        }
        match self.role_gate.role() {
            Some(role) => self.presets.for_role(role),
            None => &[],
        }
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        if self.role_gating && self.role_gate.is_unset() {
            return Role::all().into_iter().map(MenuItem::Role).collect();
        }

        let mut items: Vec<MenuItem> = self
            .visible_presets()
            .iter()
            .cloned()
            .map(MenuItem::Preset)
            .collect();
        if self.role_gating {
            items.push(MenuItem::ChangeRole);
        }
        items
    }

    pub fn menu_next(&mut self) {
        let len = self.menu_items().len();
        if len > 0 {
            self.menu_cursor = (self.menu_cursor + 1).min(len - 1);
        }
    }

    pub fn menu_prev(&mut self) {
        self.menu_cursor = self.menu_cursor.saturating_sub(1);
    }

    /// Click (or Enter) on a menu entry. A preset hands back the send it
    /// started; role entries only change the gate.
    pub fn activate_menu_item(&mut self, index: usize) -> Result<Option<PendingSend>, SendRejected> {
        if self.is_loading() {
            return Err(SendRejected::InFlight);
        }
        let Some(item) = self.menu_items().into_iter().nth(index) else {
            return Ok(None);
        };
        self.menu_cursor = index;

        match item {
            MenuItem::Role(role) => {
                self.select_role(role);
                Ok(None)
            }
            MenuItem::ChangeRole => {
                self.reset_role();
                Ok(None)
            }
            MenuItem::Preset(question) => self.send(&question).map(Some),
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Menu,
            Focus::Menu => Focus::Input,
        };
        if self.focus == Focus::Menu {
            let len = self.menu_items().len();
            self.menu_cursor = self.menu_cursor.min(len.saturating_sub(1));
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = Focus::Input;
    }

    // Send pipeline

    /// Start a send with `payload`, typed or preset.
    pub fn send(&mut self, payload: &str) -> Result<PendingSend, SendRejected> {
        let pending = self.pipeline.begin(payload, &mut self.conversation, &mut self.draft)?;
        self.cursor = 0;
        Ok(pending)
    }

    pub fn send_draft(&mut self) -> Result<PendingSend, SendRejected> {
        let payload = self.draft.clone();
        self.send(&payload)
    }

    /// Completion of the outstanding send
    pub fn settle(&mut self, outcome: Result<String, ChatError>) {
        self.pipeline.settle(outcome, &mut self.conversation);
    }

    /// Full round trip awaited in place
    pub async fn send_and_wait(&mut self, payload: &str, backend: &dyn ChatBackend) -> Result<(), SendRejected> {
        self.pipeline
            .run(payload, &mut self.conversation, &mut self.draft, backend)
            .await?;
        self.cursor = 0;
        Ok(())
    }

    // Message list scrolling

    pub fn scroll_offset(&self) -> u16 {
        self.scroll.offset()
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll.scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll.scroll_down(lines);
    }

    /// Offset to draw the message list with; snaps to the tail when a
    /// message lands or the loading flag flips.
    pub fn sync_scroll(&mut self, total_lines: u16, viewport: u16) -> u16 {
        let loading = self.is_loading();
        self.scroll.sync(self.conversation.len(), loading, total_lines, viewport)
    }

    // Draft editing. All of it is disabled while a send is in flight.

    pub fn insert_char(&mut self, c: char) {
        if self.is_loading() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.is_loading() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.is_loading() {
            return;
        }
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.draft.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }
}
