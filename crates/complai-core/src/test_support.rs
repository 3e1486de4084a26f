//! In-memory gateway double shared by the registry and controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use complai_types::error::TransportError;
use complai_types::gateway::{CreatedThread, QueryReply, SendQuery};
use complai_types::message::{MessageRole, StoredMessage};
use complai_types::mode::RetrievalMode;
use complai_types::thread::ThreadSummary;

use crate::gateway::ConversationGateway;

/// How `send_query` answers.
#[derive(Clone)]
pub enum Reply {
    /// Answer with fixed text.
    Text(String),
    /// Answer with `"answer: <query text>"`.
    Echo,
    /// Fail with a transport error.
    Fail,
    /// Never answer.
    Hang,
}

pub struct MockGateway {
    threads: Option<Vec<ThreadSummary>>,
    histories: HashMap<String, Option<Vec<StoredMessage>>>,
    next_ids: Mutex<VecDeque<String>>,
    create_fails: bool,
    list_delay: Duration,
    create_delay: Duration,
    history_delay: Duration,
    reply: Reply,
    reply_delay: Duration,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub sent: Mutex<Vec<SendQuery>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            threads: Some(Vec::new()),
            histories: HashMap::new(),
            next_ids: Mutex::new(VecDeque::new()),
            create_fails: false,
            list_delay: Duration::ZERO,
            create_delay: Duration::ZERO,
            history_delay: Duration::ZERO,
            reply: Reply::Echo,
            reply_delay: Duration::ZERO,
            create_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Add a listed thread with its stored history.
    pub fn with_thread(mut self, id: &str, title: &str, history: &[(MessageRole, &str)]) -> Self {
        self.threads.get_or_insert_with(Vec::new).push(ThreadSummary {
            id: id.to_string(),
            title: title.to_string(),
        });
        let messages = history
            .iter()
            .enumerate()
            .map(|(i, (role, text))| StoredMessage {
                id: format!("{id}-m{i}"),
                role: *role,
                content: text.to_string(),
                created_at: None,
            })
            .collect();
        self.histories.insert(id.to_string(), Some(messages));
        self
    }

    /// Make the history fetch of one thread fail.
    pub fn with_broken_history(mut self, id: &str) -> Self {
        self.histories.insert(id.to_string(), None);
        self
    }

    pub fn with_failing_list(mut self) -> Self {
        self.threads = None;
        self
    }

    pub fn with_failing_create(mut self) -> Self {
        self.create_fails = true;
        self
    }

    /// Ids handed out by successive `create_thread` calls.
    pub fn with_created_ids(self, ids: &[&str]) -> Self {
        self.next_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_history_delay(mut self, delay: Duration) -> Self {
        self.history_delay = delay;
        self
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn sent(&self) -> Vec<SendQuery> {
        self.sent.lock().unwrap().clone()
    }
}

impl ConversationGateway for MockGateway {
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, TransportError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        self.threads
            .clone()
            .ok_or_else(|| TransportError::Request("connection refused".to_string()))
    }

    async fn create_thread(&self) -> Result<CreatedThread, TransportError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        if self.create_fails {
            return Err(TransportError::Status {
                status: 500,
                body: "create failed".to_string(),
            });
        }
        let id = self
            .next_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("created-{n}"));
        Ok(CreatedThread { id })
    }

    async fn delete_thread(&self, _thread_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, TransportError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if !self.history_delay.is_zero() {
            tokio::time::sleep(self.history_delay).await;
        }
        match self.histories.get(thread_id) {
            Some(Some(messages)) => Ok(messages.clone()),
            Some(None) => Err(TransportError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            None => Err(TransportError::NotFound),
        }
    }

    async fn send_query(&self, query: &SendQuery) -> Result<QueryReply, TransportError> {
        self.sent.lock().unwrap().push(query.clone());
        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }
        match &self.reply {
            Reply::Text(text) => Ok(QueryReply {
                text: text.clone(),
                timing_ms: Some(42),
            }),
            Reply::Echo => Ok(QueryReply::text(format!("answer: {}", query.text))),
            Reply::Fail => Err(TransportError::Request("connection reset".to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn query(&self, text: &str, mode: &RetrievalMode) -> Result<QueryReply, TransportError> {
        Ok(QueryReply::text(format!("{mode}: {text}")))
    }
}
