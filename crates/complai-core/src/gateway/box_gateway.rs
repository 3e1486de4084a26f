//! BoxConversationGateway -- object-safe dynamic dispatch wrapper.
//!
//! 1. `ConversationGatewayDyn` is an object-safe mirror with boxed futures
//! 2. Blanket-impl `ConversationGatewayDyn` for all `T: ConversationGateway`
//! 3. `BoxConversationGateway` wraps `Box<dyn ConversationGatewayDyn>` and
//!    implements `ConversationGateway` again by delegation, so it can be used
//!    anywhere a concrete gateway is expected.

use std::future::Future;
use std::pin::Pin;

use complai_types::error::TransportError;
use complai_types::gateway::{CreatedThread, QueryReply, SendQuery};
use complai_types::message::StoredMessage;
use complai_types::mode::RetrievalMode;
use complai_types::thread::ThreadSummary;

use super::provider::ConversationGateway;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Object-safe version of [`ConversationGateway`] with boxed futures.
pub trait ConversationGatewayDyn: Send + Sync {
    fn list_threads_boxed(&self) -> BoxFuture<'_, Vec<ThreadSummary>>;

    fn create_thread_boxed(&self) -> BoxFuture<'_, CreatedThread>;

    fn delete_thread_boxed<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, ()>;

    fn list_messages_boxed<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, Vec<StoredMessage>>;

    fn send_query_boxed<'a>(&'a self, query: &'a SendQuery) -> BoxFuture<'a, QueryReply>;

    fn query_boxed<'a>(
        &'a self,
        text: &'a str,
        mode: &'a RetrievalMode,
    ) -> BoxFuture<'a, QueryReply>;
}

impl<T: ConversationGateway> ConversationGatewayDyn for T {
    fn list_threads_boxed(&self) -> BoxFuture<'_, Vec<ThreadSummary>> {
        Box::pin(self.list_threads())
    }

    fn create_thread_boxed(&self) -> BoxFuture<'_, CreatedThread> {
        Box::pin(self.create_thread())
    }

    fn delete_thread_boxed<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(self.delete_thread(thread_id))
    }

    fn list_messages_boxed<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, Vec<StoredMessage>> {
        Box::pin(self.list_messages(thread_id))
    }

    fn send_query_boxed<'a>(&'a self, query: &'a SendQuery) -> BoxFuture<'a, QueryReply> {
        Box::pin(self.send_query(query))
    }

    fn query_boxed<'a>(
        &'a self,
        text: &'a str,
        mode: &'a RetrievalMode,
    ) -> BoxFuture<'a, QueryReply> {
        Box::pin(self.query(text, mode))
    }
}

/// Type-erased gateway for runtime transport selection.
pub struct BoxConversationGateway {
    inner: Box<dyn ConversationGatewayDyn>,
}

impl BoxConversationGateway {
    /// Wrap a concrete gateway in a type-erased box.
    pub fn new<T: ConversationGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }
}

impl ConversationGateway for BoxConversationGateway {
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, TransportError> {
        self.inner.list_threads_boxed().await
    }

    async fn create_thread(&self) -> Result<CreatedThread, TransportError> {
        self.inner.create_thread_boxed().await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), TransportError> {
        self.inner.delete_thread_boxed(thread_id).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, TransportError> {
        self.inner.list_messages_boxed(thread_id).await
    }

    async fn send_query(&self, query: &SendQuery) -> Result<QueryReply, TransportError> {
        self.inner.send_query_boxed(query).await
    }

    async fn query(&self, text: &str, mode: &RetrievalMode) -> Result<QueryReply, TransportError> {
        self.inner.query_boxed(text, mode).await
    }
}
