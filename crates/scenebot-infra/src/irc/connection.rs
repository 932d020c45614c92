//! IrcTransport -- one registered IRC connection per bot.
//!
//! After registration two tasks own the socket: a reader that answers `PING`
//! and forwards chat events, and a writer that serializes outbound lines from
//! an mpsc queue. [`IrcTransport`] is a cheap handle onto that queue.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use scenebot_core::transport::Transport;
use scenebot_types::error::TransportError;
use scenebot_types::event::{ChatEvent, Destination};

use super::message::{IrcMessage, privmsg, strip_line_breaks};

/// How long the server has to accept the nickname.
const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the inbound event and outbound line queues.
const QUEUE_CAPACITY: usize = 64;

/// Outbound handle for one bot's IRC connection.
#[derive(Debug, Clone)]
pub struct IrcTransport {
    nick: String,
    outbound: mpsc::Sender<String>,
}

impl IrcTransport {
    /// Connect to `host:port` and register as `nick`.
    ///
    /// Returns the transport handle and the receiver of inbound chat events.
    /// The receiver yields a final [`ChatEvent::Disconnect`] when the server
    /// closes the connection.
    pub async fn connect(
        host: &str,
        port: u16,
        nick: &str,
    ) -> Result<(Self, mpsc::Receiver<ChatEvent>), TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::Connection(format!("{host}:{port}: {e}")))?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let nick = strip_line_breaks(nick);
        write_line(&mut write_half, &format!("NICK {nick}")).await?;
        write_line(&mut write_half, &format!("USER {nick} 0 * :{nick}")).await?;

        tokio::time::timeout(
            REGISTRATION_TIMEOUT,
            await_welcome(&mut reader, &mut write_half, &nick),
        )
        .await
        .map_err(|_| TransportError::Registration(format!("{nick}: no welcome from server")))??;
        info!(%nick, %host, port, "Registered with IRC server");

        let (outbound, outbound_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (events_tx, events) = mpsc::channel(QUEUE_CAPACITY);

        tokio::spawn(write_loop(write_half, outbound_rx, nick.clone()));
        tokio::spawn(read_loop(reader, events_tx, outbound.clone(), nick.clone()));

        Ok((Self { nick, outbound }, events))
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub async fn join(&self, channel: &str) -> Result<(), TransportError> {
        debug!(nick = %self.nick, %channel, "Joining channel");
        self.send_line(format!("JOIN {}", strip_line_breaks(channel)))
            .await
    }

    pub async fn quit(&self, message: &str) -> Result<(), TransportError> {
        self.send_line(format!("QUIT :{}", strip_line_breaks(message)))
            .await
    }

    async fn send_line(&self, line: String) -> Result<(), TransportError> {
        self.outbound
            .send(line)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

impl Transport for IrcTransport {
    async fn send(&self, destination: &Destination, text: &str) -> Result<(), TransportError> {
        self.send_line(privmsg(destination.target(), text)).await
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<(), TransportError> {
    writer
        .write_all(format!("{line}\r\n").as_bytes())
        .await
        .map_err(|e| TransportError::Send(e.to_string()))
}

/// Read one line, decoding invalid UTF-8 lossily. `None` on EOF.
async fn read_line(
    reader: &mut BufReader<OwnedReadHalf>,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

async fn await_welcome(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    nick: &str,
) -> Result<(), TransportError> {
    let mut buf = Vec::new();
    loop {
        let line = read_line(reader, &mut buf)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .ok_or_else(|| {
                TransportError::Connection("connection closed during registration".to_string())
            })?;
        let Some(msg) = IrcMessage::parse(&line) else {
            continue;
        };

        match msg.command.as_str() {
            "001" => return Ok(()),
            "PING" => {
                let token = msg.trailing().unwrap_or_default();
                write_line(writer, &format!("PONG :{token}")).await?;
            }
            "432" | "433" | "436" => {
                let reason = msg.trailing().unwrap_or("nickname rejected");
                return Err(TransportError::Registration(format!("{nick}: {reason}")));
            }
            "ERROR" => {
                let reason = msg.trailing().unwrap_or("server error");
                return Err(TransportError::Registration(format!("{nick}: {reason}")));
            }
            _ => {}
        }
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut lines: mpsc::Receiver<String>, nick: String) {
    while let Some(line) = lines.recv().await {
        let result = match write_line(&mut writer, &line).await {
            Ok(()) => writer.flush().await.map_err(|e| TransportError::Send(e.to_string())),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(%nick, error = %err, "IRC write failed, closing writer");
            break;
        }
    }
    debug!(%nick, "IRC writer finished");
}

async fn read_loop(
    mut reader: BufReader<OwnedReadHalf>,
    events: mpsc::Sender<ChatEvent>,
    outbound: mpsc::Sender<String>,
    nick: String,
) {
    let mut buf = Vec::new();
    let reason = loop {
        let line = match read_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break "connection closed by server".to_string(),
            Err(err) => break format!("read error: {err}"),
        };
        let Some(msg) = IrcMessage::parse(&line) else {
            continue;
        };

        if msg.command == "PING" {
            let token = msg.trailing().unwrap_or_default();
            if outbound.send(format!("PONG :{token}")).await.is_err() {
                break "writer closed".to_string();
            }
            continue;
        }

        let Some(event) = msg.to_event() else {
            continue;
        };
        if let ChatEvent::Disconnect { reason } = event {
            break reason;
        }
        if events.send(event).await.is_err() {
            debug!(%nick, "Event receiver dropped, stopping reader");
            return;
        }
    };

    info!(%nick, %reason, "IRC connection ended");
    let _ = events.send(ChatEvent::Disconnect { reason }).await;
}
