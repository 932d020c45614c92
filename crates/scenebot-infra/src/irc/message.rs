//! IRC line parsing and formatting (RFC 1459 framing).

use scenebot_types::event::ChatEvent;

/// One parsed IRC line: `[:prefix] COMMAND params... [:trailing]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    /// Middle params followed by the trailing param, if any.
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail;
                Some(prefix.to_string())
            }
            None => None,
        };

        let rest = rest.trim_start_matches(' ');
        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, tail) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = tail;
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Last param, which carries the text of most commands.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Translate into a chat event, if this line is one the bots care about.
    ///
    /// CTCP requests (`\x01...\x01`) are dropped.
    pub fn to_event(&self) -> Option<ChatEvent> {
        match self.command.as_str() {
            "PRIVMSG" => {
                let source = self.source_nick()?.to_string();
                let target = self.param(0)?;
                let text = self.param(1)?;
                if text.starts_with('\u{1}') {
                    return None;
                }
                if is_channel(target) {
                    Some(ChatEvent::ChannelMessage {
                        source,
                        channel: target.to_string(),
                        text: text.to_string(),
                    })
                } else {
                    Some(ChatEvent::PrivateMessage {
                        source,
                        text: text.to_string(),
                    })
                }
            }
            "ERROR" => Some(ChatEvent::Disconnect {
                reason: self.trailing().unwrap_or("server error").to_string(),
            }),
            _ => None,
        }
    }
}

/// Whether `target` names a channel rather than a user.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&'])
}

/// Remove line breaks so a message cannot inject extra IRC commands.
pub fn strip_line_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}

/// Format a `PRIVMSG` line (without the terminating CRLF).
pub fn privmsg(target: &str, text: &str) -> String {
    format!(
        "PRIVMSG {} :{}",
        strip_line_breaks(target),
        strip_line_breaks(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_params_and_trailing() {
        let msg = IrcMessage::parse(":carol!c@host PRIVMSG #heist :open the vault\r\n").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("carol!c@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#heist", "open the vault"]);
        assert_eq!(msg.source_nick(), Some("carol"));
    }

    #[test]
    fn parses_ping_without_prefix() {
        let msg = IrcMessage::parse("PING :irc.example.org").unwrap();
        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.trailing(), Some("irc.example.org"));
    }

    #[test]
    fn parses_numeric_with_middle_params() {
        let msg = IrcMessage::parse(":srv 433 * Alice :Nickname is already in use").unwrap();
        assert_eq!(msg.command, "433");
        assert_eq!(msg.param(0), Some("*"));
        assert_eq!(msg.param(1), Some("Alice"));
        assert_eq!(msg.trailing(), Some("Nickname is already in use"));
        assert_eq!(msg.source_nick(), Some("srv"));
    }

    #[test]
    fn trailing_keeps_colons_and_spaces() {
        let msg = IrcMessage::parse(":a PRIVMSG bob :time is 10:30  now").unwrap();
        assert_eq!(msg.param(1), Some("time is 10:30  now"));
    }

    #[test]
    fn blank_lines_are_rejected() {
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse("\r\n").is_none());
        assert!(IrcMessage::parse(":prefixonly").is_none());
    }

    #[test]
    fn channel_and_private_events() {
        let event = IrcMessage::parse(":carol!c@h PRIVMSG #heist :hi")
            .unwrap()
            .to_event();
        assert_eq!(
            event,
            Some(ChatEvent::ChannelMessage {
                source: "carol".to_string(),
                channel: "#heist".to_string(),
                text: "hi".to_string(),
            })
        );

        let event = IrcMessage::parse(":carol!c@h PRIVMSG Alice :psst")
            .unwrap()
            .to_event();
        assert_eq!(
            event,
            Some(ChatEvent::PrivateMessage {
                source: "carol".to_string(),
                text: "psst".to_string(),
            })
        );
    }

    #[test]
    fn ctcp_and_other_commands_are_not_events() {
        let ctcp = IrcMessage::parse(":carol!c@h PRIVMSG Alice :\u{1}VERSION\u{1}").unwrap();
        assert_eq!(ctcp.to_event(), None);
        let join = IrcMessage::parse(":carol!c@h JOIN #heist").unwrap();
        assert_eq!(join.to_event(), None);
    }

    #[test]
    fn error_becomes_disconnect() {
        let event = IrcMessage::parse("ERROR :Closing Link: timeout")
            .unwrap()
            .to_event();
        assert_eq!(
            event,
            Some(ChatEvent::Disconnect {
                reason: "Closing Link: timeout".to_string()
            })
        );
    }

    #[test]
    fn privmsg_strips_line_breaks() {
        assert_eq!(
            privmsg("#heist", "hello\r\nQUIT :bye"),
            "PRIVMSG #heist :helloQUIT :bye"
        );
        assert!(is_channel("&local"));
        assert!(!is_channel("carol"));
    }
}
