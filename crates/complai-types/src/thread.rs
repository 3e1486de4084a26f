//! Thread catalogue types.
//!
//! A thread is one conversation with its own ordered message history. The
//! catalogue only tracks identity, title, and whether the thread is archived;
//! messages live in the message store, correlated by thread id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel thread id used when no real thread is current.
pub const DEFAULT_THREAD_ID: &str = "default";

/// Title given to freshly created threads.
pub const NEW_THREAD_TITLE: &str = "New Chat";

/// Lifecycle status of a thread in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Regular,
    Archived,
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadStatus::Regular => write!(f, "regular"),
            ThreadStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(ThreadStatus::Regular),
            "archived" => Ok(ThreadStatus::Archived),
            other => Err(format!("invalid thread status: '{other}'")),
        }
    }
}

impl Default for ThreadStatus {
    fn default() -> Self {
        ThreadStatus::Regular
    }
}

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: ThreadStatus,
}

impl Thread {
    /// A regular thread titled "New Chat".
    pub fn new_chat(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: NEW_THREAD_TITLE.to_string(),
            status: ThreadStatus::Regular,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == ThreadStatus::Archived
    }
}

/// A thread as listed by the backend (`GET /api/chats/threads/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl From<ThreadSummary> for Thread {
    fn from(summary: ThreadSummary) -> Self {
        Thread {
            id: summary.id,
            title: summary.title,
            status: ThreadStatus::Regular,
        }
    }
}

/// Snapshot of the thread list as consumed by a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadListView {
    pub current_thread_id: String,
    pub threads: Vec<Thread>,
    pub archived_threads: Vec<Thread>,
}

impl ThreadListView {
    /// Total number of threads across both partitions.
    pub fn total(&self) -> usize {
        self.threads.len() + self.archived_threads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_status_roundtrip() {
        for status in [ThreadStatus::Regular, ThreadStatus::Archived] {
            let parsed: ThreadStatus = status.to_string().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_thread_status_default() {
        assert_eq!(ThreadStatus::default(), ThreadStatus::Regular);
    }

    #[test]
    fn test_new_chat() {
        let thread = Thread::new_chat("abc");
        assert_eq!(thread.title, "New Chat");
        assert!(!thread.is_archived());
    }

    #[test]
    fn test_summary_deserialize_ignores_extra_fields() {
        let summary: ThreadSummary = serde_json::from_str(
            r#"{"id":"9f1c","title":"GDPR","lastMessage":null,"createdAt":"2025-06-01T10:00:00Z"}"#,
        )
        .unwrap();
        let thread: Thread = summary.into();
        assert_eq!(thread.id, "9f1c");
        assert_eq!(thread.title, "GDPR");
        assert_eq!(thread.status, ThreadStatus::Regular);
    }
}
