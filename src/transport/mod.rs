//! Outbound chat surface the trivia core talks to.

pub mod console;

use futures::future::BoxFuture;
use thiserror::Error;

/// Error raised when a reply cannot be delivered to the chat platform.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform rejected or dropped an outbound message.
    #[error("failed to deliver message to channel `{channel_id}`: {message}")]
    Delivery {
        /// Channel the message was addressed to.
        channel_id: String,
        /// Platform-specific failure description.
        message: String,
    },
}

/// Abstraction over the chat platform used to emit replies and validate
/// channel references. The core only ever sends plain text.
pub trait ChatTransport: Send + Sync {
    /// Send a plain-text message to a channel.
    fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> BoxFuture<'static, Result<(), TransportError>>;

    /// Whether a channel reference points at a channel that exists.
    fn channel_exists(&self, channel_id: &str) -> BoxFuture<'static, bool>;
}
