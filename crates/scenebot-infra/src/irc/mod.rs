//! IRC chat transport.
//!
//! [`IrcTransport`] registers one nickname per bot, forwards inbound
//! `PRIVMSG`s as [`ChatEvent`](scenebot_types::event::ChatEvent)s and
//! implements [`Transport`](scenebot_core::transport::Transport) for replies.

pub mod connection;
pub mod message;

pub use connection::IrcTransport;
pub use message::IrcMessage;
