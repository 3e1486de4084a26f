//! ConversationController: the send/edit/reload/cancel state machine.
//!
//! Every send appends a `running` user message and an empty `running`
//! assistant placeholder to the current thread, asks the gateway for a reply,
//! and writes both back as `complete`. Write-back always goes through
//! [`MessageStore::update_existing`], so concurrent sends on one thread never
//! overwrite each other and a late reply never resurrects a deleted thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use complai_types::config::{ClientConfig, ThreadBootstrap};
use complai_types::error::{ConversationError, TransportError};
use complai_types::event::SessionEvent;
use complai_types::gateway::{QueryReply, SendQuery};
use complai_types::message::{AppendMessage, CompletionReason, Message, MessageRole};
use complai_types::thread::{Thread, ThreadListView};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::exchange::{Exchange, InFlight, PendingExchange, SendOutcome, query_text, write_back};
use crate::event::EventBus;
use crate::gateway::ConversationGateway;
use crate::mode::ModeSelector;
use crate::registry::{InitSummary, ThreadRegistry};
use crate::store::MessageStore;

/// Default upper bound for one gateway round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Construction options for [`ConversationController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub request_timeout: Duration,
    pub bootstrap: ThreadBootstrap,
    pub event_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            bootstrap: ThreadBootstrap::default(),
            event_capacity: crate::event::bus::DEFAULT_CAPACITY,
        }
    }
}

impl From<&ClientConfig> for ControllerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            bootstrap: config.bootstrap,
            ..Self::default()
        }
    }
}

/// Drives conversations against a gateway.
///
/// Generic over the gateway and the mode selector so the runtime can be
/// exercised with in-memory doubles.
pub struct ConversationController<G: ConversationGateway, M: ModeSelector> {
    gateway: Arc<G>,
    modes: M,
    store: MessageStore,
    registry: ThreadRegistry<G>,
    bus: EventBus,
    request_timeout: Duration,
    /// Outstanding sends keyed by assistant placeholder id.
    in_flight: DashMap<String, InFlight>,
    shutdown: CancellationToken,
}

impl<G: ConversationGateway, M: ModeSelector> ConversationController<G, M> {
    pub fn new(gateway: Arc<G>, modes: M, options: ControllerOptions) -> Self {
        let bus = EventBus::new(options.event_capacity);
        let store = MessageStore::new(bus.clone());
        let registry = ThreadRegistry::new(
            Arc::clone(&gateway),
            store.clone(),
            bus.clone(),
            options.bootstrap,
        );
        Self {
            gateway,
            modes,
            store,
            registry,
            bus,
            request_timeout: options.request_timeout,
            in_flight: DashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(gateway: Arc<G>, modes: M, config: &ClientConfig) -> Self {
        Self::new(gateway, modes, ControllerOptions::from(config))
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn modes(&self) -> &M {
        &self.modes
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn registry(&self) -> &ThreadRegistry<G> {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    /// Load the catalogue and pick the current thread.
    pub async fn initialize(&self) -> InitSummary {
        self.registry.initialize().await
    }

    // --- Sends ---

    /// Send a new user message to the current thread.
    ///
    /// Gateway failures do not surface as errors: the assistant reply
    /// completes with the fallback text and a non-`stop` reason instead.
    pub async fn on_new(&self, message: AppendMessage) -> Result<Exchange, ConversationError> {
        let text = query_text(&message)?;
        let thread_id = self.registry.current_thread_id();

        let user = Message::running(MessageRole::User, &thread_id, text.clone());
        let assistant = Message::placeholder(MessageRole::Assistant, &thread_id);
        self.store.update(&thread_id, |messages| {
            messages.push(user.clone());
            messages.push(assistant.clone());
        });

        let token = self.shutdown.child_token();
        self.in_flight.insert(
            assistant.id.clone(),
            InFlight {
                thread_id: thread_id.clone(),
                token: token.clone(),
            },
        );
        let pending = PendingExchange::new(&self.store, &self.in_flight, user, assistant);

        let query = SendQuery {
            thread_id: thread_id.clone(),
            text,
            retrieval: self.modes.retrieval_mode(),
            prompt: self.modes.prompt_config(),
        };
        debug!(
            thread_id = %thread_id,
            message_id = %pending.assistant().id,
            mode = %query.retrieval,
            "Sending query"
        );

        let start = Instant::now();
        let outcome = tokio::select! {
            _ = token.cancelled() => SendOutcome::Cancelled,
            result = tokio::time::timeout(self.request_timeout, self.gateway.send_query(&query)) => {
                match result {
                    Ok(Ok(reply)) => SendOutcome::Answered(reply),
                    Ok(Err(e)) => SendOutcome::Failed(e),
                    Err(_) => SendOutcome::TimedOut,
                }
            }
        };
        let elapsed = start.elapsed();

        match &outcome {
            SendOutcome::Answered(_) => {}
            SendOutcome::Failed(e) => {
                warn!(thread_id = %thread_id, error = %e, "Query failed, showing fallback reply");
            }
            SendOutcome::Cancelled => info!(thread_id = %thread_id, "Query cancelled"),
            SendOutcome::TimedOut => warn!(
                thread_id = %thread_id,
                timeout_secs = self.request_timeout.as_secs(),
                "Query timed out"
            ),
        }

        let (reply_text, reason, timing_ms) = outcome.resolve();
        let user = pending.user().clone().complete(CompletionReason::Stop);
        let assistant = pending
            .assistant()
            .clone()
            .with_text(reply_text)
            .complete(reason);
        pending.disarm();

        if !write_back(&self.store, &thread_id, &[&user, &assistant]) {
            debug!(thread_id = %thread_id, "Thread deleted before reply arrived, dropping it");
        }

        Ok(Exchange {
            thread_id,
            user,
            assistant,
            timing_ms,
            elapsed,
        })
    }

    /// Re-send an edited message. Appends a new exchange; history is not
    /// rewritten.
    pub async fn on_edit(&self, message: AppendMessage) -> Result<Exchange, ConversationError> {
        self.on_new(message).await
    }

    /// Re-send the message `parent_id` of the current thread.
    pub async fn on_reload(&self, parent_id: &str) -> Result<Exchange, ConversationError> {
        let parent = self
            .messages()
            .into_iter()
            .find(|m| m.id == parent_id)
            .ok_or_else(|| ConversationError::NotFound(parent_id.to_string()))?;
        self.on_new(AppendMessage {
            content: parent.content,
            parent_id: Some(parent_id.to_string()),
        })
        .await
    }

    /// Re-send the most recent user message of the current thread.
    pub async fn reload_last(&self) -> Result<Exchange, ConversationError> {
        let last = self
            .messages()
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .ok_or_else(|| ConversationError::NotFound("last user message".to_string()))?;
        self.on_reload(&last.id).await
    }

    /// Cancel every in-flight exchange of the current thread.
    ///
    /// Returns how many exchanges were cancelled.
    pub fn on_cancel(&self) -> usize {
        let thread_id = self.registry.current_thread_id();
        self.cancel_where(|entry| entry.thread_id == thread_id)
    }

    /// Cancel every in-flight exchange on every thread.
    pub fn cancel_all(&self) -> usize {
        self.cancel_where(|_| true)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn cancel_where(&self, matches: impl Fn(&InFlight) -> bool) -> usize {
        let tokens: Vec<CancellationToken> = self
            .in_flight
            .iter()
            .filter(|entry| matches(entry.value()))
            .map(|entry| entry.value().token.clone())
            .collect();
        for token in &tokens {
            token.cancel();
        }
        if !tokens.is_empty() {
            info!(cancelled = tokens.len(), "Cancelled in-flight queries");
        }
        tokens.len()
    }

    /// One-off question outside any thread, using the selected mode.
    pub async fn ask(&self, text: &str) -> Result<QueryReply, ConversationError> {
        let mode = self.modes.retrieval_mode();
        match tokio::time::timeout(self.request_timeout, self.gateway.query(text, &mode)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Request(format!(
                "no reply within {}s",
                self.request_timeout.as_secs()
            ))
            .into()),
        }
    }

    // --- Thread list adapter ---

    /// Messages of the current thread.
    pub fn messages(&self) -> Vec<Message> {
        self.store.get(&self.registry.current_thread_id())
    }

    pub fn thread_messages(&self, thread_id: &str) -> Vec<Message> {
        self.store.get(thread_id)
    }

    pub fn current_thread_id(&self) -> String {
        self.registry.current_thread_id()
    }

    pub fn thread_list(&self) -> ThreadListView {
        self.registry.view()
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.registry.threads()
    }

    pub fn archived_threads(&self) -> Vec<Thread> {
        self.registry.archived_threads()
    }

    pub async fn switch_to_new(&self) -> Result<String, ConversationError> {
        Ok(self.registry.switch_to_new().await?)
    }

    pub fn switch_to(&self, thread_id: &str) -> bool {
        self.registry.switch_to(thread_id)
    }

    pub fn rename(&self, thread_id: &str, title: &str) -> Result<(), ConversationError> {
        self.registry.rename(thread_id, title)
    }

    pub fn archive(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.registry.archive(thread_id)
    }

    pub fn unarchive(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.registry.unarchive(thread_id)
    }

    /// Delete a thread locally, cancelling any sends still waiting on it.
    pub fn delete(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.registry.delete(thread_id)?;
        self.cancel_where(|entry| entry.thread_id == thread_id);
        Ok(())
    }
}

impl<G: ConversationGateway, M: ModeSelector> Drop for ConversationController<G, M> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
