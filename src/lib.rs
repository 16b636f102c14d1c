pub mod app;
pub mod client;
pub mod config;
pub mod conversation;
pub mod handler;
pub mod launcher;
pub mod logging;
pub mod outside_click;
pub mod pipeline;
pub mod role;
pub mod scroll;
pub mod tui;
pub mod ui;
pub mod widget;

// Re-export main types for convenience
pub use app::App;
pub use client::{ChatBackend, ChatError, HttpChatClient};
pub use config::Config;
pub use conversation::{Conversation, Message, Sender};
pub use pipeline::{SendPipeline, SendRejected, APOLOGY};
pub use role::{PresetQuestions, Role};
pub use widget::ChatWidget;
