//! Message store for one widget instance.
//!
//! The conversation is append-only: entries are never edited, removed or
//! reordered, and insertion order is render order.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single chat entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
    timestamp: String,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: now_iso8601(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// ISO-8601 UTC timestamp, millisecond precision
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `HH:MM` in local time, or an empty string if the timestamp is unreadable
    pub fn short_time(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(text, Sender::User));
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(text, Sender::Bot));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation.push_bot("hello");
        conversation.push_user("hi");

        let senders: Vec<Sender> = conversation.messages().iter().map(|m| m.sender()).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::User]);
        // duplicates are kept
        assert_eq!(conversation.messages()[0].text(), conversation.messages()[2].text());
    }

    #[test]
    fn test_timestamp_is_iso8601_utc() {
        let msg = Message::new("x", Sender::User);
        let parsed = chrono::DateTime::parse_from_rfc3339(msg.timestamp());
        assert!(parsed.is_ok());
        assert!(msg.timestamp().ends_with('Z'));
        assert_eq!(msg.short_time().len(), 5);
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let msg = Message::new("x", Sender::Bot);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "bot");
        assert_eq!(json["text"], "x");
    }
}
