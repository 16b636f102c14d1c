//! Send pipeline: commit a user entry, make one remote call, settle with a
//! bot entry.
//!
//! The loading flag doubles as a single-flight guard. `begin` refuses to
//! start while a send is outstanding, so a second request can never be
//! issued by the same widget no matter how `send` is reached.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ChatBackend, ChatError};
use crate::conversation::Conversation;

/// Bot entry appended when the remote call fails for any reason
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a message is already being sent")]
    InFlight,
}

/// A committed send waiting for its single outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending send must be dispatched or settled"]
pub struct PendingSend {
    message: String,
}

impl PendingSend {
    /// Trimmed payload carried by the outbound request
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Issue the request on a background task and hand the outcome to
    /// `on_settled` once it completes. `on_settled` fires even if the
    /// request task dies, so the loading flag always comes back down.
    pub fn spawn<F>(self, backend: Arc<dyn ChatBackend>, on_settled: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<String, ChatError>) + Send + 'static,
    {
        let message = self.message;
        tokio::spawn(async move {
            let request = tokio::spawn(async move { backend.send_message(&message).await });
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(error = %err, "chat request task failed");
                    Err(ChatError::Network("request task failed".to_string()))
                }
            };
            on_settled(outcome);
        })
    }
}

#[derive(Debug, Default)]
pub struct SendPipeline {
    loading: bool,
}

impl SendPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Append the user entry, clear the draft and raise the loading flag.
    pub fn begin(
        &mut self,
        payload: &str,
        conversation: &mut Conversation,
        draft: &mut String,
    ) -> Result<PendingSend, SendRejected> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.loading {
            return Err(SendRejected::InFlight);
        }

        conversation.push_user(payload);
        draft.clear();
        self.loading = true;
        debug!(chars = trimmed.chars().count(), "send committed");

        Ok(PendingSend {
            message: trimmed.to_string(),
        })
    }

    /// Append the bot entry for a finished request and drop the loading flag.
    pub fn settle(&mut self, outcome: Result<String, ChatError>, conversation: &mut Conversation) {
        if !self.loading {
            warn!("reply arrived with no send outstanding, ignoring");
            return;
        }

        match outcome {
            Ok(text) => {
                info!("reply received");
                conversation.push_bot(text);
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                conversation.push_bot(APOLOGY);
            }
        }
        self.loading = false;
    }

    /// Whole round trip awaited inline.
    pub async fn run(
        &mut self,
        payload: &str,
        conversation: &mut Conversation,
        draft: &mut String,
        backend: &dyn ChatBackend,
    ) -> Result<(), SendRejected> {
        let pending = self.begin(payload, conversation, draft)?;
        let outcome = backend.send_message(pending.message()).await;
        self.settle(outcome, conversation);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::conversation::Sender;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend that records every message and answers from a fixed script
    pub(crate) struct ScriptedBackend {
        pub reply: Result<String, ()>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_message(&self, message: &str) -> Result<String, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(message.to_string());
            self.reply
                .clone()
                .map_err(|_| ChatError::Network("connection refused".to_string()))
        }
    }

    /// Backend whose request task dies before producing an outcome
    pub(crate) struct PanickingBackend;

    #[async_trait]
    impl ChatBackend for PanickingBackend {
        async fn send_message(&self, _message: &str) -> Result<String, ChatError> {
            panic!("backend crashed");
        }
    }

    #[test]
    fn test_blank_payload_is_ignored() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = "   ".to_string();

        for payload in ["", "   ", "\n\t "] {
            assert_eq!(
                pipeline.begin(payload, &mut conversation, &mut draft),
                Err(SendRejected::Empty)
            );
        }
        assert!(conversation.is_empty());
        assert!(!pipeline.is_loading());
        assert_eq!(draft, "   ");
    }

    #[test]
    fn test_begin_commits_user_entry_and_loads() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = "What is DTE EMIS?".to_string();

        let pending = pipeline
            .begin("  What is DTE EMIS?  ", &mut conversation, &mut draft)
            .unwrap();

        assert_eq!(pending.message(), "What is DTE EMIS?");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].sender(), Sender::User);
        assert!(draft.is_empty());
        assert!(pipeline.is_loading());
    }

    #[test]
    fn test_second_begin_rejected_while_loading() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = String::new();

        let _pending = pipeline.begin("first", &mut conversation, &mut draft).unwrap();
        assert_eq!(
            pipeline.begin("second", &mut conversation, &mut draft),
            Err(SendRejected::InFlight)
        );
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_settle_failure_appends_apology_and_clears_flag() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = String::new();

        let _pending = pipeline.begin("hello", &mut conversation, &mut draft).unwrap();
        pipeline.settle(Err(ChatError::Status(500)), &mut conversation);

        assert!(!pipeline.is_loading());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1].text(), APOLOGY);
        assert_eq!(conversation.messages()[1].sender(), Sender::Bot);
    }

    #[test]
    fn test_settle_without_send_is_ignored() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        pipeline.settle(Ok("stray".to_string()), &mut conversation);
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_run_success_scenario() {
        let backend = ScriptedBackend::ok("DTE EMIS is ...");
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = "What is DTE EMIS?".to_string();

        pipeline
            .run("What is DTE EMIS?", &mut conversation, &mut draft, &backend)
            .await
            .unwrap();

        let texts: Vec<&str> = conversation.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["What is DTE EMIS?", "DTE EMIS is ..."]);
        assert_eq!(conversation.messages()[1].sender(), Sender::Bot);
        assert!(!pipeline.is_loading());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_failure_scenario() {
        let backend = ScriptedBackend::failing();
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = String::new();

        pipeline
            .run("What is DTE EMIS?", &mut conversation, &mut draft, &backend)
            .await
            .unwrap();

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1].text(), APOLOGY);
        assert!(!pipeline.is_loading());
    }

    #[tokio::test]
    async fn test_spawn_hands_outcome_to_callback() {
        let backend = Arc::new(ScriptedBackend::ok("pong"));
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = String::new();

        let pending = pipeline.begin(" ping ", &mut conversation, &mut draft).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        pending
            .spawn(backend.clone(), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await
            .unwrap();

        let outcome = rx.await.unwrap();
        pipeline.settle(outcome, &mut conversation);
        assert_eq!(conversation.last().unwrap().text(), "pong");
        assert_eq!(backend.seen.lock().unwrap().as_slice(), ["ping".to_string()]);
    }

    #[tokio::test]
    async fn test_spawn_settles_when_request_task_panics() {
        let mut pipeline = SendPipeline::new();
        let mut conversation = Conversation::new();
        let mut draft = String::new();

        let pending = pipeline.begin("hello", &mut conversation, &mut draft).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        pending
            .spawn(Arc::new(PanickingBackend), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await
            .unwrap();

        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, Err(ChatError::Network(_))));
        pipeline.settle(outcome, &mut conversation);
        assert!(!pipeline.is_loading());
        assert_eq!(conversation.last().unwrap().text(), APOLOGY);
    }
}
