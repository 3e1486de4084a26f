//! Request and reply types exchanged with the conversation gateway.

use serde::{Deserialize, Serialize};

use crate::mode::{PromptConfig, RetrievalMode};

/// A user query sent to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendQuery {
    pub thread_id: String,
    pub text: String,
    pub retrieval: RetrievalMode,
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// The backend's single, non-streamed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReply {
    pub text: String,
    /// Backend-side execution time, when the backend reports it.
    #[serde(default)]
    pub timing_ms: Option<u64>,
}

impl QueryReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timing_ms: None,
        }
    }
}

/// A thread freshly created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedThread {
    pub id: String,
}
