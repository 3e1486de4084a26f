use thiserror::Error;

/// Errors from the network boundary to the compliance backend.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not authorized")]
    Unauthorized,

    #[error("resource not found")]
    NotFound,

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Errors surfaced by the conversation runtime to its caller.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),

    #[error("message '{0}' not found in the current thread")]
    NotFound(String),

    #[error("thread '{0}' not found")]
    ThreadNotFound(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors parsing a `"<type>/<mode>"` selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeParseError {
    #[error("mode '{0}' must be written as '<type>/<mode>'")]
    MissingSeparator(String),

    #[error("mode '{0}' has an empty type or mode")]
    EmptySegment(String),
}

/// Errors loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("io error: {0}")]
    Io(String),
}
