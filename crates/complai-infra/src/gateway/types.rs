//! Wire types for the compliance backend's chat and query endpoints.
//!
//! These mirror the backend's JSON exactly. The provider-agnostic shapes the
//! runtime works with live in `complai_types::gateway`.

use serde::{Deserialize, Serialize};

use complai_types::gateway::{CreatedThread, QueryReply};
use complai_types::message::StoredMessage;
use complai_types::mode::SystemPromptType;
use complai_types::thread::ThreadSummary;

/// `GET /api/chats/threads/`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadsResponse {
    #[serde(default)]
    pub threads: Vec<ThreadSummary>,
}

/// `POST /api/chats/threads/`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThreadResponse {
    pub thread: CreatedThread,
}

/// `GET /api/chats/threads/{id}/messages/`
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

/// `POST /api/chats/threads/{id}/messages/`
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub message: &'a str,
    #[serde(rename = "type")]
    pub retrieval_type: &'a str,
    pub mode: &'a str,
    pub system_prompt_type: SystemPromptType,
    pub custom_prompt: &'a str,
}

/// `POST /api/compliance/query/`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub mode: &'a str,
}

/// Execution time as reported by the backend: seconds, either as a JSON
/// number or as a formatted string such as `"1.2345"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplyTime {
    Seconds(f64),
    Formatted(String),
}

impl ReplyTime {
    pub fn as_millis(&self) -> Option<u64> {
        let seconds = match self {
            ReplyTime::Seconds(seconds) => *seconds,
            ReplyTime::Formatted(raw) => raw.trim().parse::<f64>().ok()?,
        };
        (seconds.is_finite() && seconds >= 0.0).then(|| (seconds * 1000.0).round() as u64)
    }
}

/// Reply body of both the thread message and the ad-hoc query endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyBody {
    pub text: String,
    #[serde(default)]
    pub time: Option<ReplyTime>,
}

impl From<ReplyBody> for QueryReply {
    fn from(body: ReplyBody) -> Self {
        QueryReply {
            timing_ms: body.time.as_ref().and_then(ReplyTime::as_millis),
            text: body.text,
        }
    }
}
