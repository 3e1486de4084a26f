//! `MessageStore` is a concurrent thread-id -> messages map backed by `DashMap`.
//!
//! Sequences are cloned on read so no `DashMap` guard outlives a call, and
//! every write publishes `SessionEvent::MessagesChanged` on the event bus.

use std::sync::Arc;

use complai_types::event::SessionEvent;
use complai_types::message::Message;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;

use crate::event::EventBus;

/// Ordered message log per thread.
///
/// Cloning produces a shared handle to the same underlying map.
#[derive(Debug, Clone)]
pub struct MessageStore {
    inner: Arc<DashMap<String, Vec<Message>>>,
    bus: EventBus,
}

impl MessageStore {
    /// Create an empty store publishing into `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            bus,
        }
    }

    /// Cloned sequence for a thread; empty when the thread is unknown.
    pub fn get(&self, thread_id: &str) -> Vec<Message> {
        self.inner
            .get(thread_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Replace the whole sequence of a thread.
    pub fn set(&self, thread_id: &str, messages: Vec<Message>) {
        self.inner.insert(thread_id.to_string(), messages);
        self.notify(thread_id);
    }

    /// Apply `reducer` to the latest sequence of a thread, creating an empty
    /// one first if the thread has none.
    ///
    /// The reducer runs under the per-key lock, so two concurrent updates to
    /// the same thread are applied one after the other and neither is lost.
    pub fn update<R>(&self, thread_id: &str, reducer: impl FnOnce(&mut Vec<Message>) -> R) -> R {
        let result = {
            let mut entry = self.inner.entry(thread_id.to_string()).or_default();
            reducer(entry.value_mut())
        };
        self.notify(thread_id);
        result
    }

    /// Like [`update`](Self::update), but only if the thread still exists.
    ///
    /// Returns `None` (and publishes nothing) when the thread was removed,
    /// so late results never resurrect a deleted thread.
    pub fn update_existing<R>(
        &self,
        thread_id: &str,
        reducer: impl FnOnce(&mut Vec<Message>) -> R,
    ) -> Option<R> {
        let result = {
            let mut entry = self.inner.get_mut(thread_id)?;
            reducer(entry.value_mut())
        };
        self.notify(thread_id);
        Some(result)
    }

    /// Insert an empty sequence unless the thread already has one.
    ///
    /// Returns true when a new sequence was created.
    pub fn ensure(&self, thread_id: &str) -> bool {
        let created = match self.inner.entry(thread_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Vec::new());
                true
            }
        };
        if created {
            self.notify(thread_id);
        }
        created
    }

    /// Drop a thread's sequence, returning it if present.
    pub fn remove(&self, thread_id: &str) -> Option<Vec<Message>> {
        let removed = self.inner.remove(thread_id).map(|(_, messages)| messages);
        if removed.is_some() {
            self.notify(thread_id);
        }
        removed
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        self.inner.contains_key(thread_id)
    }

    /// Snapshot of all thread ids that have a sequence.
    pub fn thread_ids(&self) -> Vec<String> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Subscribe to change events of this store (and anything sharing its bus).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    fn notify(&self, thread_id: &str) {
        self.bus.publish(SessionEvent::MessagesChanged {
            thread_id: thread_id.to_string(),
        });
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(EventBus::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complai_types::message::MessageRole;

    fn msg(thread_id: &str, text: &str) -> Message {
        Message::running(MessageRole::User, thread_id, text)
    }

    #[test]
    fn get_missing_returns_empty() {
        let store = MessageStore::default();
        assert!(store.get("nope").is_empty());
        assert!(!store.contains("nope"));
    }

    #[test]
    fn set_replaces_whole_sequence() {
        let store = MessageStore::default();
        store.set("t1", vec![msg("t1", "a"), msg("t1", "b")]);
        store.set("t1", vec![msg("t1", "c")]);

        let messages = store.get("t1");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "c");
    }

    #[test]
    fn update_applies_against_latest() {
        let store = MessageStore::default();
        store.set("t1", vec![msg("t1", "a")]);

        let stale = store.get("t1");
        store.update("t1", |messages| messages.push(msg("t1", "b")));
        store.update("t1", |messages| messages.push(msg("t1", "c")));

        assert_eq!(stale.len(), 1);
        let texts: Vec<_> = store.get("t1").iter().map(Message::text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_creates_missing_thread() {
        let store = MessageStore::default();
        let len = store.update("fresh", |messages| {
            messages.push(msg("fresh", "x"));
            messages.len()
        });
        assert_eq!(len, 1);
        assert!(store.contains("fresh"));
    }

    #[test]
    fn update_existing_skips_removed_thread() {
        let store = MessageStore::default();
        store.set("t1", vec![msg("t1", "a")]);
        store.remove("t1");

        let result = store.update_existing("t1", |messages| messages.push(msg("t1", "late")));
        assert!(result.is_none());
        assert!(!store.contains("t1"));
    }

    #[test]
    fn ensure_does_not_clobber() {
        let store = MessageStore::default();
        store.set("t1", vec![msg("t1", "a")]);

        assert!(!store.ensure("t1"));
        assert_eq!(store.get("t1").len(), 1);
        assert!(store.ensure("t2"));
        assert!(store.get("t2").is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn writes_publish_events() {
        let store = MessageStore::default();
        let mut rx = store.subscribe();

        store.set("t1", Vec::new());
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::MessagesChanged {
                thread_id: "t1".to_string()
            }
        );

        store.remove("missing");
        assert!(rx.try_recv().is_err());
    }
}
