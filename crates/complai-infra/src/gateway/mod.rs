//! HTTP implementation of the conversation gateway.

pub mod http;
pub mod types;

pub use http::HttpConversationGateway;
