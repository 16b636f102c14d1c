use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::client::{ChatBackend, ChatError};
use crate::config::Config;
use crate::pipeline::{PendingSend, SendRejected};
use crate::tui::AppEvent;
use crate::widget::ChatWidget;

/// Screen areas from the last render, for mouse hit-testing
#[derive(Debug, Default, Clone)]
pub struct Regions {
    pub launcher: Option<Rect>,
    pub dialog: Option<Rect>,
    pub messages: Option<Rect>,
    pub input: Option<Rect>,
    pub send_button: Option<Rect>,
    // (area, menu item index)
    pub menu: Vec<(Rect, usize)>,
}

pub struct App {
    pub should_quit: bool,
    pub widget: ChatWidget,
    pub endpoint: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub regions: Regions,

    backend: Arc<dyn ChatBackend>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: &Config, backend: Arc<dyn ChatBackend>, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            widget: ChatWidget::from_config(config),
            endpoint: config.endpoint.clone(),
            animation_frame: 0,
            regions: Regions::default(),
            backend,
            events,
        }
    }

    /// Commit the draft through the send pipeline
    pub fn send_draft(&mut self) {
        let started = self.widget.send_draft();
        self.dispatch(started);
    }

    /// Click (or Enter) on a preset/role entry
    pub fn activate_menu_item(&mut self, index: usize) {
        match self.widget.activate_menu_item(index) {
            Ok(Some(pending)) => self.dispatch(Ok(pending)),
            Ok(None) => {}
            Err(rejected) => self.dispatch(Err(rejected)),
        }
    }

    fn dispatch(&mut self, started: Result<PendingSend, SendRejected>) {
        match started {
            Ok(pending) => {
                let events = self.events.clone();
                pending.spawn(Arc::clone(&self.backend), move |outcome| {
                    // Receiver gone means the app is shutting down
                    let _ = events.send(AppEvent::Reply(outcome));
                });
            }
            Err(rejected) => debug!(reason = %rejected, "send rejected"),
        }
    }

    pub fn on_reply(&mut self, outcome: Result<String, ChatError>) {
        self.widget.settle(outcome);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
