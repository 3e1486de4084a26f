//! Message, content part, and message status types.
//!
//! A `Message` is one bubble in a thread: a user query or an assistant reply.
//! Messages are created `running` by the controller and always end up
//! `complete` with the same id; they are never removed mid-flight.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reply shown in place of an assistant answer that could not be obtained.
pub const FALLBACK_REPLY: &str = "Something went wrong. Try again.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Why a message reached the `complete` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    /// Normal completion.
    Stop,
    /// The gateway call failed; the assistant text is [`FALLBACK_REPLY`].
    Error,
    /// The exchange was cancelled before the backend answered.
    Cancelled,
    /// The backend did not answer within the request timeout.
    Timeout,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::Stop => write!(f, "stop"),
            CompletionReason::Error => write!(f, "error"),
            CompletionReason::Cancelled => write!(f, "cancelled"),
            CompletionReason::Timeout => write!(f, "timeout"),
        }
    }
}

/// Lifecycle status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageStatus {
    Running,
    Complete { reason: CompletionReason },
}

impl MessageStatus {
    /// Normal completion (`complete` / `stop`).
    pub const fn stopped() -> Self {
        MessageStatus::Complete {
            reason: CompletionReason::Stop,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, MessageStatus::Running)
    }

    /// The completion reason, or `None` while running.
    pub fn reason(&self) -> Option<CompletionReason> {
        match self {
            MessageStatus::Running => None,
            MessageStatus::Complete { reason } => Some(*reason),
        }
    }
}

/// One part of a message body.
///
/// Only text is produced or consumed by the runtime. The tag keeps the
/// shape open for other part kinds; anything that is not text
/// deserializes into `Unsupported` and is rejected on send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Short name of the part kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentPart::Text { .. } => "text",
            ContentPart::Unsupported => "unsupported",
        }
    }
}

/// Metadata attached to every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Owning thread. Not enforced by the store, only carried along.
    pub thread_id: String,
}

/// A single message within a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub status: MessageStatus,
    pub content: Vec<ContentPart>,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Mint a client-side message id, unique per send attempt.
    pub fn new_id() -> String {
        format!("message-{}", Uuid::now_v7())
    }

    /// A `running` message with a single text part and a fresh id.
    pub fn running(role: MessageRole, thread_id: &str, text: impl Into<String>) -> Self {
        Self {
            id: Self::new_id(),
            role,
            status: MessageStatus::Running,
            content: vec![ContentPart::text(text)],
            metadata: MessageMetadata {
                thread_id: thread_id.to_string(),
            },
            created_at: Utc::now(),
        }
    }

    /// A `running` message with no content yet (assistant reply placeholder).
    pub fn placeholder(role: MessageRole, thread_id: &str) -> Self {
        Self {
            content: Vec::new(),
            ..Self::running(role, thread_id, "")
        }
    }

    /// The concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The same message, completed with the given reason.
    pub fn complete(mut self, reason: CompletionReason) -> Self {
        self.status = MessageStatus::Complete { reason };
        self
    }

    /// The same message, with its body replaced by a single text part.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = vec![ContentPart::text(text)];
        self
    }
}

/// A message submitted by the rendering layer (new, edited, or reloaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendMessage {
    pub content: Vec<ContentPart>,
    /// Id of the message this one follows, when the surface knows it.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl AppendMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            parent_id: None,
        }
    }
}

/// A message as stored by the backend (`GET .../messages/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredMessage {
    /// Convert a backend message into a complete local message.
    pub fn into_message(self, thread_id: &str) -> Message {
        Message {
            id: self.id,
            role: self.role,
            status: MessageStatus::stopped(),
            content: vec![ContentPart::Text { text: self.content }],
            metadata: MessageMetadata {
                thread_id: thread_id.to_string(),
            },
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}
