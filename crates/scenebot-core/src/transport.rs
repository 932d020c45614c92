//! Chat transport port.

use scenebot_types::error::TransportError;
use scenebot_types::event::Destination;

/// Outbound side of a bot's chat connection.
///
/// Inbound events arrive separately as a stream of
/// [`ChatEvent`](scenebot_types::event::ChatEvent)s. Implementations live in
/// scenebot-infra (e.g., `IrcTransport`).
pub trait Transport: Send + Sync {
    /// Send one message line to `destination`.
    fn send(
        &self,
        destination: &Destination,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
