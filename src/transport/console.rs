//! Terminal-backed transport used by the standalone binary.

use futures::future::BoxFuture;

use super::{ChatTransport, TransportError};

/// Transport that prints outbound messages to stdout. Every channel
/// reference is considered valid.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    /// Build a console transport.
    pub fn new() -> Self {
        Self
    }
}

impl ChatTransport for ConsoleTransport {
    fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        let line = format!("[#{channel_id}] {text}");
        Box::pin(async move {
            println!("{line}");
            Ok(())
        })
    }

    fn channel_exists(&self, _channel_id: &str) -> BoxFuture<'static, bool> {
        Box::pin(async { true })
    }
}
