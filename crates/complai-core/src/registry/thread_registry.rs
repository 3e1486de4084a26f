//! Thread registry: the in-memory catalogue of threads plus the current one.
//!
//! The catalogue is a single ordered list; the regular and archived
//! partitions are filtered views over it. Rename, archive, and delete are
//! local-only: the backend is not told about them.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use complai_types::config::ThreadBootstrap;
use complai_types::error::{ConversationError, TransportError};
use complai_types::event::SessionEvent;
use complai_types::message::Message;
use complai_types::thread::{DEFAULT_THREAD_ID, Thread, ThreadListView, ThreadStatus};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::event::EventBus;
use crate::gateway::ConversationGateway;
use crate::store::MessageStore;

/// Outcome of [`ThreadRegistry::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSummary {
    pub current_thread_id: String,
    /// Thread created for this session, if any.
    pub created_thread_id: Option<String>,
    pub threads_listed: usize,
    pub histories_loaded: usize,
    /// Threads whose history could not be fetched; they render as empty.
    pub histories_failed: Vec<String>,
}

#[derive(Debug)]
struct Catalogue {
    threads: Vec<Thread>,
    current_thread_id: String,
}

impl Catalogue {
    fn position(&self, thread_id: &str) -> Option<usize> {
        self.threads.iter().position(|t| t.id == thread_id)
    }

    /// Insert a thread, or refresh the title of an existing entry in place.
    fn upsert(&mut self, thread: Thread) {
        match self.position(&thread.id) {
            Some(index) => self.threads[index].title = thread.title,
            None => self.threads.push(thread),
        }
    }
}

/// In-memory catalogue of threads and the currently selected thread.
pub struct ThreadRegistry<G: ConversationGateway> {
    gateway: Arc<G>,
    store: MessageStore,
    bus: EventBus,
    bootstrap: ThreadBootstrap,
    catalogue: RwLock<Catalogue>,
}

impl<G: ConversationGateway> ThreadRegistry<G> {
    /// Create an empty registry whose current thread is the sentinel.
    pub fn new(
        gateway: Arc<G>,
        store: MessageStore,
        bus: EventBus,
        bootstrap: ThreadBootstrap,
    ) -> Self {
        Self {
            gateway,
            store,
            bus,
            bootstrap,
            catalogue: RwLock::new(Catalogue {
                threads: Vec::new(),
                current_thread_id: DEFAULT_THREAD_ID.to_string(),
            }),
        }
    }

    pub fn bootstrap(&self) -> ThreadBootstrap {
        self.bootstrap
    }

    // --- Startup ---

    /// Pick a current thread and load the catalogue with its histories.
    ///
    /// Never fails: listing and history failures leave the affected threads
    /// empty, and a failed thread creation leaves the sentinel current.
    pub async fn initialize(&self) -> InitSummary {
        let (created_thread_id, listed) = match self.bootstrap {
            ThreadBootstrap::AlwaysCreate => {
                tokio::join!(self.adopt_created_thread(), self.load_catalogue())
            }
            ThreadBootstrap::ReuseLatest => {
                let listed = self.load_catalogue().await;
                let created = match listed.ids.first() {
                    Some(latest) => {
                        self.switch_to(latest);
                        None
                    }
                    None => self.adopt_created_thread().await,
                };
                (created, listed)
            }
        };

        if created_thread_id.is_none() && self.current_thread_id() == DEFAULT_THREAD_ID {
            self.store.ensure(DEFAULT_THREAD_ID);
        }

        let summary = InitSummary {
            current_thread_id: self.current_thread_id(),
            created_thread_id,
            threads_listed: listed.ids.len(),
            histories_loaded: listed.loaded,
            histories_failed: listed.failed,
        };
        info!(
            current_thread_id = %summary.current_thread_id,
            threads = summary.threads_listed,
            failed_histories = summary.histories_failed.len(),
            bootstrap = %self.bootstrap,
            "Thread registry initialized"
        );
        summary
    }

    async fn adopt_created_thread(&self) -> Option<String> {
        match self.gateway.create_thread().await {
            Ok(created) => {
                self.store.ensure(&created.id);
                {
                    let mut catalogue = self.write();
                    if catalogue.position(&created.id).is_none() {
                        catalogue.threads.push(Thread::new_chat(created.id.clone()));
                    }
                    catalogue.current_thread_id = created.id.clone();
                }
                self.bus.publish(SessionEvent::ThreadsChanged);
                self.bus.publish(SessionEvent::CurrentThreadChanged {
                    thread_id: created.id.clone(),
                });
                debug!(thread_id = %created.id, "Adopted freshly created thread");
                Some(created.id)
            }
            Err(e) => {
                warn!(error = %e, "Could not create a thread, staying on the default thread");
                None
            }
        }
    }

    async fn load_catalogue(&self) -> ListedThreads {
        let summaries = match self.gateway.list_threads().await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(error = %e, "Could not list threads, starting with none");
                return ListedThreads::default();
            }
        };

        let ids: Vec<String> = summaries.iter().map(|s| s.id.clone()).collect();
        {
            // Held across both writes so a concurrent delete sees the thread
            // either fully listed or not at all.
            let mut catalogue = self.write();
            for summary in summaries {
                self.store.ensure(&summary.id);
                catalogue.upsert(summary.into());
            }
        }
        self.bus.publish(SessionEvent::ThreadsChanged);

        let fetches = ids.iter().map(|thread_id| self.load_history(thread_id));
        let results = join_all(fetches).await;

        let mut listed = ListedThreads {
            ids,
            ..ListedThreads::default()
        };
        for (thread_id, loaded) in listed.ids.iter().zip(results) {
            if loaded {
                listed.loaded += 1;
            } else {
                listed.failed.push(thread_id.clone());
            }
        }
        listed
    }

    /// Fetch one thread's history and merge it in front of any messages
    /// added locally while the fetch was outstanding.
    ///
    /// A thread deleted while its fetch was outstanding stays deleted.
    async fn load_history(&self, thread_id: &str) -> bool {
        match self.gateway.list_messages(thread_id).await {
            Ok(stored) => {
                let history: Vec<Message> = stored
                    .into_iter()
                    .map(|m| m.into_message(thread_id))
                    .collect();
                let known: HashSet<String> = history.iter().map(|m| m.id.clone()).collect();
                let merged = self.store.update_existing(thread_id, move |messages| {
                    let local: Vec<Message> = messages
                        .drain(..)
                        .filter(|m| !known.contains(&m.id))
                        .collect();
                    *messages = history;
                    messages.extend(local);
                });
                if merged.is_none() {
                    debug!(thread_id = %thread_id, "Thread deleted before its history arrived");
                }
                true
            }
            Err(e) => {
                warn!(thread_id = %thread_id, error = %e, "Could not load thread history");
                false
            }
        }
    }

    // --- Adapter operations ---

    /// Create a thread on the backend and make it current.
    ///
    /// The empty message sequence is in place before the thread is listed, so
    /// a listed thread without a sequence is never observable.
    pub async fn switch_to_new(&self) -> Result<String, TransportError> {
        let created = self.gateway.create_thread().await?;
        self.store.set(&created.id, Vec::new());
        {
            let mut catalogue = self.write();
            catalogue.upsert(Thread::new_chat(created.id.clone()));
            catalogue.current_thread_id = created.id.clone();
        }
        self.bus.publish(SessionEvent::ThreadsChanged);
        self.bus.publish(SessionEvent::CurrentThreadChanged {
            thread_id: created.id.clone(),
        });
        info!(thread_id = %created.id, "Switched to new thread");
        Ok(created.id)
    }

    /// Make `thread_id` current. Returns false when it already was.
    pub fn switch_to(&self, thread_id: &str) -> bool {
        {
            let mut catalogue = self.write();
            if catalogue.current_thread_id == thread_id {
                return false;
            }
            catalogue.current_thread_id = thread_id.to_string();
        }
        self.bus.publish(SessionEvent::CurrentThreadChanged {
            thread_id: thread_id.to_string(),
        });
        debug!(thread_id = %thread_id, "Switched thread");
        true
    }

    /// Change a thread's title. Local only.
    pub fn rename(&self, thread_id: &str, title: &str) -> Result<(), ConversationError> {
        {
            let mut catalogue = self.write();
            let index = catalogue
                .position(thread_id)
                .ok_or_else(|| ConversationError::ThreadNotFound(thread_id.to_string()))?;
            catalogue.threads[index].title = title.to_string();
        }
        self.bus.publish(SessionEvent::ThreadsChanged);
        Ok(())
    }

    /// Move a thread into the archived partition. Local only.
    pub fn archive(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.set_status(thread_id, ThreadStatus::Archived)
    }

    /// Move a thread back into the regular partition. Local only.
    pub fn unarchive(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.set_status(thread_id, ThreadStatus::Regular)
    }

    fn set_status(&self, thread_id: &str, status: ThreadStatus) -> Result<(), ConversationError> {
        let changed = {
            let mut catalogue = self.write();
            let index = catalogue
                .position(thread_id)
                .ok_or_else(|| ConversationError::ThreadNotFound(thread_id.to_string()))?;
            let thread = &mut catalogue.threads[index];
            let changed = thread.status != status;
            thread.status = status;
            changed
        };
        if changed {
            debug!(thread_id = %thread_id, status = %status, "Thread status changed");
            self.bus.publish(SessionEvent::ThreadsChanged);
        }
        Ok(())
    }

    /// Remove a thread and its messages. Local only.
    ///
    /// Deleting the current thread makes the sentinel thread current.
    pub fn delete(&self, thread_id: &str) -> Result<(), ConversationError> {
        let (listed, was_current) = {
            let mut catalogue = self.write();
            let listed = match catalogue.position(thread_id) {
                Some(index) => {
                    catalogue.threads.remove(index);
                    true
                }
                None => false,
            };
            let was_current = catalogue.current_thread_id == thread_id;
            if was_current {
                catalogue.current_thread_id = DEFAULT_THREAD_ID.to_string();
            }
            (listed, was_current)
        };

        let had_messages = self.store.remove(thread_id).is_some();
        if !listed && !had_messages {
            return Err(ConversationError::ThreadNotFound(thread_id.to_string()));
        }

        if listed {
            self.bus.publish(SessionEvent::ThreadsChanged);
        }
        if was_current {
            self.bus.publish(SessionEvent::CurrentThreadChanged {
                thread_id: DEFAULT_THREAD_ID.to_string(),
            });
        }
        info!(thread_id = %thread_id, was_current, "Thread deleted");
        Ok(())
    }

    // --- Reads ---

    pub fn current_thread_id(&self) -> String {
        self.read().current_thread_id.clone()
    }

    pub fn thread(&self, thread_id: &str) -> Option<Thread> {
        self.read().threads.iter().find(|t| t.id == thread_id).cloned()
    }

    /// Regular (non-archived) threads in catalogue order.
    pub fn threads(&self) -> Vec<Thread> {
        self.filtered(ThreadStatus::Regular)
    }

    pub fn archived_threads(&self) -> Vec<Thread> {
        self.filtered(ThreadStatus::Archived)
    }

    /// Every catalogued thread regardless of status.
    pub fn all_threads(&self) -> Vec<Thread> {
        self.read().threads.clone()
    }

    /// Consistent snapshot of both partitions and the current id.
    pub fn view(&self) -> ThreadListView {
        let catalogue = self.read();
        let (archived_threads, threads) = catalogue
            .threads
            .iter()
            .cloned()
            .partition(|t: &Thread| t.is_archived());
        ThreadListView {
            current_thread_id: catalogue.current_thread_id.clone(),
            threads,
            archived_threads,
        }
    }

    fn filtered(&self, status: ThreadStatus) -> Vec<Thread> {
        self.read()
            .threads
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Catalogue> {
        self.catalogue.read().expect("thread catalogue lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Catalogue> {
        self.catalogue.write().expect("thread catalogue lock poisoned")
    }
}

#[derive(Debug, Default)]
struct ListedThreads {
    ids: Vec<String>,
    loaded: usize,
    failed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use complai_types::message::MessageRole;

    use crate::test_support::MockGateway;

    fn registry(
        gateway: MockGateway,
        bootstrap: ThreadBootstrap,
    ) -> (ThreadRegistry<MockGateway>, MessageStore) {
        let bus = EventBus::new(64);
        let store = MessageStore::new(bus.clone());
        let registry = ThreadRegistry::new(Arc::new(gateway), store.clone(), bus, bootstrap);
        (registry, store)
    }

    #[tokio::test]
    async fn initialize_creates_current_and_loads_histories() {
        let gateway = MockGateway::new()
            .with_created_ids(&["fresh"])
            .with_thread("t1", "GDPR", &[(MessageRole::User, "q"), (MessageRole::Assistant, "a")])
            .with_thread("t2", "DORA", &[]);
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let summary = registry.initialize().await;

        assert_eq!(summary.current_thread_id, "fresh");
        assert_eq!(summary.created_thread_id.as_deref(), Some("fresh"));
        assert_eq!(summary.threads_listed, 2);
        assert_eq!(summary.histories_loaded, 2);
        assert!(summary.histories_failed.is_empty());

        let ids: Vec<_> = registry.threads().into_iter().map(|t| t.id).collect();
        assert!(ids.contains(&"t1".to_string()));
        assert!(ids.contains(&"fresh".to_string()));
        assert_eq!(store.get("t1").len(), 2);
        assert!(store.get("t1").iter().all(|m| !m.status.is_running()));
        assert!(store.contains("fresh"));
    }

    #[tokio::test]
    async fn initialize_absorbs_per_thread_history_failure() {
        let gateway = MockGateway::new()
            .with_thread("ok", "Fine", &[(MessageRole::User, "hello")])
            .with_thread("bad", "Broken", &[])
            .with_broken_history("bad");
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let summary = registry.initialize().await;

        assert_eq!(summary.histories_loaded, 1);
        assert_eq!(summary.histories_failed, vec!["bad".to_string()]);
        assert_eq!(store.get("ok").len(), 1);
        assert!(store.get("bad").is_empty());
        assert!(registry.thread("bad").is_some());
    }

    #[tokio::test]
    async fn initialize_treats_list_failure_as_no_threads() {
        let gateway = MockGateway::new().with_failing_list().with_created_ids(&["solo"]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let summary = registry.initialize().await;

        assert_eq!(summary.threads_listed, 0);
        assert_eq!(summary.current_thread_id, "solo");
        assert_eq!(registry.threads().len(), 1);
    }

    #[tokio::test]
    async fn initialize_falls_back_to_default_when_create_fails() {
        let gateway = MockGateway::new().with_failing_create();
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let summary = registry.initialize().await;

        assert_eq!(summary.current_thread_id, DEFAULT_THREAD_ID);
        assert!(summary.created_thread_id.is_none());
        assert!(store.contains(DEFAULT_THREAD_ID));
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_tolerates_create_arriving_after_list() {
        let gateway = MockGateway::new()
            .with_created_ids(&["t1"])
            .with_create_delay(Duration::from_millis(50))
            .with_thread("t1", "Listed title", &[(MessageRole::User, "old")]);
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        registry.initialize().await;

        assert_eq!(registry.current_thread_id(), "t1");
        assert_eq!(registry.all_threads().len(), 1);
        assert_eq!(registry.thread("t1").unwrap().title, "Listed title");
        assert_eq!(store.get("t1").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_tolerates_create_arriving_before_list() {
        let gateway = MockGateway::new()
            .with_created_ids(&["t1"])
            .with_list_delay(Duration::from_millis(50))
            .with_thread("t1", "Listed title", &[]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        registry.initialize().await;

        assert_eq!(registry.current_thread_id(), "t1");
        assert_eq!(registry.all_threads().len(), 1);
        assert_eq!(registry.thread("t1").unwrap().title, "Listed title");
    }

    #[tokio::test]
    async fn reuse_latest_skips_creation_when_threads_exist() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_thread("recent", "Recent", &[])
                .with_thread("older", "Older", &[]),
        );
        let store = MessageStore::default();
        let registry = ThreadRegistry::new(
            Arc::clone(&gateway),
            store,
            EventBus::default(),
            ThreadBootstrap::ReuseLatest,
        );

        let summary = registry.initialize().await;

        assert_eq!(summary.current_thread_id, "recent");
        assert!(summary.created_thread_id.is_none());
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reuse_latest_creates_when_list_is_empty() {
        let gateway = MockGateway::new().with_created_ids(&["first"]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::ReuseLatest);

        let summary = registry.initialize().await;

        assert_eq!(summary.created_thread_id.as_deref(), Some("first"));
        assert_eq!(registry.current_thread_id(), "first");
    }

    #[tokio::test]
    async fn switch_to_new_adds_regular_new_chat_and_makes_it_current() {
        let gateway = MockGateway::new().with_created_ids(&["n1"]);
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        let mut rx = store.subscribe();

        let id = registry.switch_to_new().await.unwrap();

        assert_eq!(id, "n1");
        assert_eq!(registry.current_thread_id(), "n1");
        let thread = registry.thread("n1").unwrap();
        assert_eq!(thread.title, "New Chat");
        assert_eq!(thread.status, ThreadStatus::Regular);
        assert!(registry.threads().iter().any(|t| t.id == "n1"));
        assert!(store.contains("n1"));
        assert!(store.get("n1").is_empty());

        // The sequence is announced before the thread is listed.
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::MessagesChanged { thread_id: "n1".to_string() }
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::ThreadsChanged);
    }

    #[tokio::test]
    async fn switch_to_new_failure_changes_nothing() {
        let gateway = MockGateway::new().with_failing_create();
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        assert!(registry.switch_to_new().await.is_err());
        assert_eq!(registry.current_thread_id(), DEFAULT_THREAD_ID);
        assert!(registry.all_threads().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn switch_to_current_is_a_no_op() {
        let gateway = MockGateway::new().with_created_ids(&["a"]);
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        registry.switch_to_new().await.unwrap();
        let mut rx = store.subscribe();

        assert!(!registry.switch_to("a"));
        assert!(rx.try_recv().is_err());

        assert!(registry.switch_to("b"));
        assert_eq!(registry.current_thread_id(), "b");
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::CurrentThreadChanged { thread_id: "b".to_string() }
        );
    }

    #[tokio::test]
    async fn rename_is_local_only() {
        let gateway = MockGateway::new().with_created_ids(&["a"]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        registry.switch_to_new().await.unwrap();

        registry.rename("a", "Vendor audit").unwrap();
        assert_eq!(registry.thread("a").unwrap().title, "Vendor audit");

        assert!(matches!(
            registry.rename("missing", "x"),
            Err(ConversationError::ThreadNotFound(_))
        ));
    }

    #[tokio::test]
    async fn archive_round_trip_preserves_total() {
        let gateway = MockGateway::new().with_created_ids(&["a", "b"]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        registry.switch_to_new().await.unwrap();
        registry.switch_to_new().await.unwrap();
        let before = registry.view().total();

        registry.archive("a").unwrap();
        let view = registry.view();
        assert!(view.threads.iter().all(|t| t.id != "a"));
        assert!(view.archived_threads.iter().any(|t| t.id == "a"));
        assert_eq!(view.total(), before);

        registry.unarchive("a").unwrap();
        let view = registry.view();
        assert!(view.threads.iter().any(|t| t.id == "a"));
        assert!(view.archived_threads.is_empty());
        assert_eq!(view.total(), before);
    }

    #[tokio::test]
    async fn delete_current_resets_to_default_and_drops_messages() {
        let gateway = MockGateway::new().with_created_ids(&["a"]);
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        registry.switch_to_new().await.unwrap();
        store.update("a", |m| m.push(Message::running(MessageRole::User, "a", "hi")));

        registry.delete("a").unwrap();

        assert_eq!(registry.current_thread_id(), DEFAULT_THREAD_ID);
        assert!(registry.thread("a").is_none());
        assert!(store.get("a").is_empty());
        assert!(!store.contains("a"));
    }

    #[tokio::test]
    async fn delete_other_thread_keeps_current() {
        let gateway = MockGateway::new().with_created_ids(&["a", "b"]);
        let (registry, _store) = registry(gateway, ThreadBootstrap::AlwaysCreate);
        registry.switch_to_new().await.unwrap();
        registry.switch_to_new().await.unwrap();

        registry.delete("a").unwrap();

        assert_eq!(registry.current_thread_id(), "b");
        assert!(matches!(
            registry.delete("a"),
            Err(ConversationError::ThreadNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_during_history_fetch_stays_deleted() {
        let gateway = MockGateway::new()
            .with_created_ids(&["fresh"])
            .with_thread("t1", "GDPR", &[(MessageRole::User, "q")])
            .with_history_delay(Duration::from_millis(100));
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let (summary, deleted) = tokio::join!(registry.initialize(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.delete("t1")
        });

        assert!(deleted.is_ok());
        assert_eq!(summary.threads_listed, 1);
        assert!(registry.thread("t1").is_none());
        assert!(!store.contains("t1"));
        assert!(store.get("t1").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_history_of_deleted_thread_is_not_recreated() {
        let gateway = MockGateway::new()
            .with_created_ids(&["fresh"])
            .with_thread("t1", "GDPR", &[])
            .with_broken_history("t1")
            .with_history_delay(Duration::from_millis(100));
        let (registry, store) = registry(gateway, ThreadBootstrap::AlwaysCreate);

        let (summary, _) = tokio::join!(registry.initialize(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.delete("t1")
        });

        assert_eq!(summary.histories_failed, vec!["t1".to_string()]);
        assert!(!store.contains("t1"));
    }

    #[tokio::test]
    async fn listed_threads_have_a_sequence_even_when_history_fails() {
        let gateway = MockGateway::new()
            .with_thread("t1", "GDPR", &[])
            .with_broken_history("t1");
        let (registry, store) = registry(gateway, ThreadBootstrap::ReuseLatest);

        registry.initialize().await;

        assert!(store.contains("t1"));
        assert!(store.get("t1").is_empty());
    }
}
