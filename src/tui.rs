use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::client::ChatError;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// Outcome of the outstanding chat request
    Reply(Result<String, ChatError>),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Terminal input plus the animation tick
    pub fn new() -> Self {
        let handler = Self::channel();
        handler.spawn_input_reader();
        handler.spawn_ticker(Duration::from_millis(300));
        handler
    }

    /// Bare queue with no producers attached yet
    pub fn channel() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    pub fn spawn_input_reader(&self) {
        let tx_events = self.tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only handle key press events, not release
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(error = %err, "terminal event stream error");
                        None
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });
    }

    /// Drives the loading animation
    pub fn spawn_ticker(&self, period: Duration) {
        let tx_tick = self.tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });
    }

    /// Sender for completions produced off the UI loop
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    // Mouse capture feeds the launcher and outside-click handling
    execute!(io::stderr(), crossterm::event::EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture)?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::app::App;
    use crate::client::ChatBackend;
    use crate::config::Config;
    use crate::pipeline::tests::ScriptedBackend;

    #[tokio::test]
    async fn test_reply_sent_through_sender_reaches_next() {
        let mut events = EventHandler::channel();
        events.sender().send(AppEvent::Reply(Ok("pong".to_string()))).unwrap();

        match events.next().await {
            Some(AppEvent::Reply(Ok(text))) => assert_eq!(text, "pong"),
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_app_send_lands_on_event_queue() {
        let mut events = EventHandler::channel();
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedBackend::failing());
        let mut app = App::new(&Config::default(), backend, events.sender());

        for c in "hello".chars() {
            app.widget.insert_char(c);
        }
        app.send_draft();

        match events.next().await {
            Some(AppEvent::Reply(outcome)) => {
                assert!(matches!(outcome, Err(ChatError::Network(_))));
                app.on_reply(outcome);
            }
            other => panic!("expected reply, got {:?}", other),
        }
        assert!(!app.widget.is_loading());
    }

    #[tokio::test]
    async fn test_ticker_delivers_ticks() {
        let mut events = EventHandler::channel();
        events.spawn_ticker(Duration::from_millis(10));

        assert!(matches!(events.next().await, Some(AppEvent::Tick)));
        assert!(matches!(events.next().await, Some(AppEvent::Tick)));
    }
}
