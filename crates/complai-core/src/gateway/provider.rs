//! ConversationGateway trait definition.
//!
//! Every operation is a single asynchronous round trip with no retry and no
//! partial results: it resolves with the parsed payload or a `TransportError`.

use std::future::Future;

use complai_types::error::TransportError;
use complai_types::gateway::{CreatedThread, QueryReply, SendQuery};
use complai_types::message::StoredMessage;
use complai_types::mode::RetrievalMode;
use complai_types::thread::ThreadSummary;

/// Transport to the conversational backend.
///
/// Implementations live in complai-infra (e.g., `HttpConversationGateway`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ConversationGateway: Send + Sync {
    /// List the caller's threads, most recently updated first.
    fn list_threads(
        &self,
    ) -> impl Future<Output = Result<Vec<ThreadSummary>, TransportError>> + Send;

    /// Create an empty thread and return its backend id.
    fn create_thread(&self) -> impl Future<Output = Result<CreatedThread, TransportError>> + Send;

    /// Delete a thread and its messages on the backend.
    fn delete_thread(
        &self,
        thread_id: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// List the stored messages of a thread in creation order.
    fn list_messages(
        &self,
        thread_id: &str,
    ) -> impl Future<Output = Result<Vec<StoredMessage>, TransportError>> + Send;

    /// Send a user query to a thread and wait for the assistant reply.
    fn send_query(
        &self,
        query: &SendQuery,
    ) -> impl Future<Output = Result<QueryReply, TransportError>> + Send;

    /// Ask the backend a one-off question outside any thread.
    fn query(
        &self,
        text: &str,
        mode: &RetrievalMode,
    ) -> impl Future<Output = Result<QueryReply, TransportError>> + Send;
}
