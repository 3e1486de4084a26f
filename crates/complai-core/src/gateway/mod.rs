//! Network boundary to the compliance backend.
//!
//! - `ConversationGateway`: RPITIT trait for concrete transports
//! - `BoxConversationGateway`: object-safe wrapper for runtime selection

pub mod box_gateway;
pub mod provider;

pub use box_gateway::BoxConversationGateway;
pub use provider::ConversationGateway;
