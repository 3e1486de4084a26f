//! One send attempt: a user message and the assistant reply it produced.

use std::time::Duration;

use complai_types::error::{ConversationError, TransportError};
use complai_types::gateway::QueryReply;
use complai_types::message::{
    AppendMessage, CompletionReason, ContentPart, FALLBACK_REPLY, Message,
};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::store::MessageStore;

/// Result of a send as written back into the message store.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub thread_id: String,
    pub user: Message,
    pub assistant: Message,
    /// Backend-reported execution time, if any.
    pub timing_ms: Option<u64>,
    /// Wall time of the gateway round trip as seen by the client.
    pub elapsed: Duration,
}

impl Exchange {
    pub fn reason(&self) -> Option<CompletionReason> {
        self.assistant.status.reason()
    }

    pub fn is_answered(&self) -> bool {
        self.reason() == Some(CompletionReason::Stop)
    }
}

/// Extract the query text from a submitted message.
///
/// Exactly one text part is accepted; anything else is rejected before any
/// state changes.
pub(crate) fn query_text(message: &AppendMessage) -> Result<String, ConversationError> {
    match message.content.as_slice() {
        [ContentPart::Text { text }] => Ok(text.clone()),
        [] => Err(ConversationError::UnsupportedContent(
            "message has no content".to_string(),
        )),
        [part] => Err(ConversationError::UnsupportedContent(format!(
            "'{}' parts are not supported, only text",
            part.kind()
        ))),
        parts => Err(ConversationError::UnsupportedContent(format!(
            "expected a single text part, got {}",
            parts.len()
        ))),
    }
}

/// How the gateway call for an exchange ended.
#[derive(Debug)]
pub(crate) enum SendOutcome {
    Answered(QueryReply),
    Failed(TransportError),
    Cancelled,
    TimedOut,
}

impl SendOutcome {
    /// Assistant text, completion reason, and backend timing.
    pub(crate) fn resolve(self) -> (String, CompletionReason, Option<u64>) {
        match self {
            SendOutcome::Answered(reply) => (reply.text, CompletionReason::Stop, reply.timing_ms),
            SendOutcome::Failed(_) => (FALLBACK_REPLY.to_string(), CompletionReason::Error, None),
            SendOutcome::Cancelled => {
                (FALLBACK_REPLY.to_string(), CompletionReason::Cancelled, None)
            }
            SendOutcome::TimedOut => (FALLBACK_REPLY.to_string(), CompletionReason::Timeout, None),
        }
    }
}

/// Replace the resolved messages by id in the latest sequence of a thread,
/// appending any that are no longer there.
///
/// Returns false when the thread was deleted in the meantime.
pub(crate) fn write_back(store: &MessageStore, thread_id: &str, resolved: &[&Message]) -> bool {
    store
        .update_existing(thread_id, |messages| {
            for message in resolved {
                match messages.iter_mut().find(|m| m.id == message.id) {
                    Some(slot) => *slot = (*message).clone(),
                    None => messages.push((*message).clone()),
                }
            }
        })
        .is_some()
}

/// Bookkeeping for a send that has not resolved yet.
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    pub thread_id: String,
    pub token: CancellationToken,
}

/// Resolves the placeholders of an exchange whose send future is dropped
/// before it finishes, so no message is left `running`.
pub(crate) struct PendingExchange<'a> {
    store: &'a MessageStore,
    in_flight: &'a DashMap<String, InFlight>,
    user: Message,
    assistant: Message,
    armed: bool,
}

impl<'a> PendingExchange<'a> {
    pub(crate) fn new(
        store: &'a MessageStore,
        in_flight: &'a DashMap<String, InFlight>,
        user: Message,
        assistant: Message,
    ) -> Self {
        Self {
            store,
            in_flight,
            user,
            assistant,
            armed: true,
        }
    }

    pub(crate) fn user(&self) -> &Message {
        &self.user
    }

    pub(crate) fn assistant(&self) -> &Message {
        &self.assistant
    }

    /// The exchange resolved normally; nothing left to clean up.
    pub(crate) fn disarm(mut self) {
        self.in_flight.remove(&self.assistant.id);
        self.armed = false;
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.in_flight.remove(&self.assistant.id);
        let thread_id = self.assistant.metadata.thread_id.clone();
        let user = self.user.clone().complete(CompletionReason::Stop);
        let assistant = self
            .assistant
            .clone()
            .with_text(FALLBACK_REPLY)
            .complete(CompletionReason::Cancelled);
        write_back(self.store, &thread_id, &[&user, &assistant]);
        tracing::debug!(
            thread_id = %thread_id,
            message_id = %assistant.id,
            "Abandoned exchange resolved as cancelled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complai_types::message::MessageRole;

    #[test]
    fn query_text_accepts_single_text_part() {
        let text = query_text(&AppendMessage::text("Is X compliant?")).unwrap();
        assert_eq!(text, "Is X compliant?");
    }

    #[test]
    fn query_text_rejects_other_shapes() {
        let empty = AppendMessage {
            content: Vec::new(),
            parent_id: None,
        };
        let two = AppendMessage {
            content: vec![ContentPart::text("a"), ContentPart::text("b")],
            parent_id: None,
        };
        let image = AppendMessage {
            content: vec![ContentPart::Unsupported],
            parent_id: None,
        };
        for message in [empty, two, image] {
            assert!(matches!(
                query_text(&message),
                Err(ConversationError::UnsupportedContent(_))
            ));
        }
    }

    #[test]
    fn outcomes_map_to_reasons() {
        let (text, reason, timing) = SendOutcome::Answered(QueryReply {
            text: "Yes".to_string(),
            timing_ms: Some(1200),
        })
        .resolve();
        assert_eq!((text.as_str(), reason, timing), ("Yes", CompletionReason::Stop, Some(1200)));

        let (text, reason, _) = SendOutcome::Failed(TransportError::Unauthorized).resolve();
        assert_eq!(text, FALLBACK_REPLY);
        assert_eq!(reason, CompletionReason::Error);

        assert_eq!(SendOutcome::Cancelled.resolve().1, CompletionReason::Cancelled);
        assert_eq!(SendOutcome::TimedOut.resolve().1, CompletionReason::Timeout);
    }

    #[test]
    fn write_back_replaces_by_id_and_appends_missing() {
        let store = MessageStore::default();
        let user = Message::running(MessageRole::User, "t1", "q");
        let assistant = Message::placeholder(MessageRole::Assistant, "t1");
        store.set("t1", vec![user.clone()]);

        let done_user = user.complete(CompletionReason::Stop);
        let done_assistant = assistant.with_text("a").complete(CompletionReason::Stop);
        assert!(write_back(&store, "t1", &[&done_user, &done_assistant]));

        let messages = store.get("t1");
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| !m.status.is_running()));
        assert_eq!(messages[1].text(), "a");
    }

    #[test]
    fn write_back_skips_deleted_thread() {
        let store = MessageStore::default();
        let user = Message::running(MessageRole::User, "gone", "q");
        assert!(!write_back(&store, "gone", &[&user]));
        assert!(!store.contains("gone"));
    }

    #[test]
    fn dropped_pending_exchange_resolves_as_cancelled() {
        let store = MessageStore::default();
        let in_flight = DashMap::new();
        let user = Message::running(MessageRole::User, "t1", "q");
        let assistant = Message::placeholder(MessageRole::Assistant, "t1");
        store.set("t1", vec![user.clone(), assistant.clone()]);
        in_flight.insert(
            assistant.id.clone(),
            InFlight {
                thread_id: "t1".to_string(),
                token: CancellationToken::new(),
            },
        );

        drop(PendingExchange::new(&store, &in_flight, user, assistant));

        let messages = store.get("t1");
        assert_eq!(messages[1].status.reason(), Some(CompletionReason::Cancelled));
        assert_eq!(messages[1].text(), FALLBACK_REPLY);
        assert!(in_flight.is_empty());
    }

    #[test]
    fn disarmed_pending_exchange_leaves_store_alone() {
        let store = MessageStore::default();
        let in_flight = DashMap::new();
        let user = Message::running(MessageRole::User, "t1", "q");
        let assistant = Message::placeholder(MessageRole::Assistant, "t1");
        store.set("t1", vec![user.clone(), assistant.clone()]);

        PendingExchange::new(&store, &in_flight, user, assistant).disarm();

        assert!(store.get("t1").iter().all(|m| m.status.is_running()));
    }
}
