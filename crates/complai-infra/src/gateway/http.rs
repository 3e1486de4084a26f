//! HttpConversationGateway -- concrete [`ConversationGateway`] over the
//! compliance backend's REST API.
//!
//! Each operation is one request with no retry. Non-2xx statuses are mapped
//! onto [`TransportError`] variants; the auth token is wrapped in
//! [`secrecy::SecretString`] and only exposed when building the header.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use complai_core::gateway::ConversationGateway;
use complai_types::config::ClientConfig;
use complai_types::error::TransportError;
use complai_types::gateway::{CreatedThread, QueryReply, SendQuery};
use complai_types::message::StoredMessage;
use complai_types::mode::RetrievalMode;
use complai_types::thread::ThreadSummary;

use super::types::{
    CreateThreadResponse, MessagesResponse, QueryRequest, ReplyBody, SendMessageRequest,
    ThreadsResponse,
};

/// REST client for the compliance backend.
///
/// Does not derive Debug so the token can never end up in a log line.
pub struct HttpConversationGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    auth_scheme: String,
}

impl HttpConversationGateway {
    /// Create a gateway for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            auth_scheme: "Token".to_string(),
        })
    }

    /// Create a gateway from client configuration and an optional token.
    pub fn from_config(
        config: &ClientConfig,
        token: Option<SecretString>,
    ) -> Result<Self, TransportError> {
        let gateway = Self::new(config.base_url.clone(), config.request_timeout())?
            .with_auth_scheme(config.auth_scheme.clone());
        Ok(match token {
            Some(token) => gateway.with_token(token),
            None => gateway,
        })
    }

    /// Attach `Authorization: <scheme> <token>` to every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header("accept", "application/json");
        match &self.token {
            Some(token) => builder.header(
                "authorization",
                format!("{} {}", self.auth_scheme, token.expose_secret()),
            ),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(format!("failed to parse response: {e}")))
    }
}

/// Map a non-success status onto the transport error taxonomy.
fn status_error(status: StatusCode, body: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized,
        StatusCode::NOT_FOUND => TransportError::NotFound,
        _ => TransportError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

impl ConversationGateway for HttpConversationGateway {
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, TransportError> {
        let body: ThreadsResponse = self
            .fetch(self.request(Method::GET, "/api/chats/threads/"))
            .await?;
        debug!(count = body.threads.len(), "Listed threads");
        Ok(body.threads)
    }

    async fn create_thread(&self) -> Result<CreatedThread, TransportError> {
        let body: CreateThreadResponse = self
            .fetch(
                self.request(Method::POST, "/api/chats/threads/")
                    .json(&serde_json::json!({})),
            )
            .await?;
        debug!(thread_id = %body.thread.id, "Created thread");
        Ok(body.thread)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), TransportError> {
        let path = format!("/api/chats/threads/{thread_id}/");
        self.send(self.request(Method::DELETE, &path)).await?;
        debug!(thread_id = %thread_id, "Deleted thread on backend");
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, TransportError> {
        let path = format!("/api/chats/threads/{thread_id}/messages/");
        let body: MessagesResponse = self.fetch(self.request(Method::GET, &path)).await?;
        Ok(body.messages)
    }

    async fn send_query(&self, query: &SendQuery) -> Result<QueryReply, TransportError> {
        let path = format!("/api/chats/threads/{}/messages/", query.thread_id);
        let request = SendMessageRequest {
            message: &query.text,
            retrieval_type: &query.retrieval.retrieval_type,
            mode: &query.retrieval.retrieval_mode,
            system_prompt_type: query.prompt.system_prompt_type,
            custom_prompt: &query.prompt.custom_prompt,
        };
        let body: ReplyBody = self
            .fetch(self.request(Method::POST, &path).json(&request))
            .await?;
        Ok(body.into())
    }

    async fn query(&self, text: &str, mode: &RetrievalMode) -> Result<QueryReply, TransportError> {
        let request = QueryRequest {
            query: text,
            mode: &mode.retrieval_mode,
        };
        let body: ReplyBody = self
            .fetch(
                self.request(Method::POST, "/api/compliance/query/")
                    .json(&request),
            )
            .await?;
        Ok(body.into())
    }
}
