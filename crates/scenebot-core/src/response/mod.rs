//! Reply post-processing: control-character sanitizing and transport-sized
//! chunking.
//!
//! The chunk threshold compares bytes, but the packing target and overlap are
//! measured in characters, and neither accounts for the framing the transport
//! adds to each message (nickname, command, target).

mod splitter;

use scenebot_types::config::ChunkPolicy;

use splitter::split_text;

/// Characters stripped from reply boundaries.
const CONTROL: &[char] = &['\r', '\n', '\t'];

/// Sentence boundary used when a reply must be split.
pub const SENTENCE_SEPARATOR: &str = ".";

/// A processed reply: one message, or several sent in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkedReply {
    Single(String),
    Chunks(Vec<String>),
}

impl ChunkedReply {
    /// The messages to send, in order. Empty messages are dropped.
    pub fn into_messages(self) -> Vec<String> {
        match self {
            ChunkedReply::Single(text) if text.is_empty() => Vec::new(),
            ChunkedReply::Single(text) => vec![text],
            ChunkedReply::Chunks(chunks) => chunks.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }
}

/// Strip leading/trailing `\r`, `\n` and `\t` and delete every `\n`.
///
/// Embedded tabs and carriage returns are kept. The result is a fixed point:
/// `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    text.trim_start_matches(CONTROL)
        .replace('\n', "")
        .trim_matches(CONTROL)
        .to_string()
}

/// Sanitize `text` and split it into chunks if it does not fit `policy.max_bytes`.
///
/// Below the threshold the sanitized text is returned as [`ChunkedReply::Single`].
/// Otherwise it is split on [`SENTENCE_SEPARATOR`] and packed into chunks of
/// about `policy.chunk_size` characters, each sharing up to
/// `policy.chunk_overlap` characters of trailing sentences with its predecessor.
/// Any chunk still reaching `policy.max_bytes` (a long run without separators,
/// or multi-byte text) is cut further so every message stays under the limit.
pub fn chunk(text: &str, policy: &ChunkPolicy) -> ChunkedReply {
    let clean = sanitize(text);
    if clean.len() < policy.max_bytes {
        return ChunkedReply::Single(clean);
    }

    let chunks: Vec<String> = split_text(
        &clean,
        SENTENCE_SEPARATOR,
        policy.chunk_size,
        policy.chunk_overlap,
    )
    .iter()
    .map(|c| sanitize(c))
    .flat_map(|c| {
        if c.len() < policy.max_bytes {
            vec![c]
        } else {
            hard_split(&c, policy.max_bytes)
        }
    })
    .filter(|c| !c.is_empty())
    .collect();

    tracing::debug!(
        bytes = clean.len(),
        chunks = chunks.len(),
        "Reply exceeds transport threshold, split into chunks"
    );
    ChunkedReply::Chunks(chunks)
}

/// Cut `text` into trimmed pieces shorter than `max_bytes` bytes, at char
/// boundaries, preferring the last space before the limit.
fn hard_split(text: &str, max_bytes: usize) -> Vec<String> {
    let limit = max_bytes.saturating_sub(1).max(1);
    let mut pieces = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= limit {
            pieces.push(rest);
            break;
        }
        let mut end = limit;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // A single char wider than the limit still has to go out.
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        } else if rest.as_bytes()[end] != b' ' {
            if let Some(space) = rest[..end].rfind(' ').filter(|&i| i > 0) {
                end = space;
            }
        }
        pieces.push(&rest[..end]);
        rest = &rest[end..];
    }

    pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_bytes: usize) -> ChunkPolicy {
        ChunkPolicy {
            max_bytes,
            ..ChunkPolicy::default()
        }
    }

    fn long_reply(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence {i:02} describes the vault door."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn sanitize_strips_boundaries_and_newlines_only() {
        assert_eq!(sanitize("\nhello\tworld\r\n"), "hello\tworld");
        assert_eq!(sanitize("a\r\nb"), "a\rb");
        assert_eq!(sanitize("x\ny\n"), "xy");
        assert_eq!(sanitize("\t\r\n"), "");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn sanitize_exposed_tail_is_stripped() {
        // Deleting the newline leaves a tab at the end, which is then stripped.
        assert_eq!(sanitize("done\t\n"), "done");
        assert_eq!(sanitize("\r\nline one\nline two\t\r"), "line oneline two");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["\nhello\tworld\r\n", "a\r\nb", "\t\tx\n\ny\r", "", "a.\n b."] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not a fixed point for {input:?}");
        }
    }

    #[test]
    fn short_reply_is_single() {
        assert_eq!(chunk("hi\n", &policy(480)), ChunkedReply::Single("hi".to_string()));
    }

    #[test]
    fn threshold_compares_bytes_not_chars() {
        // 200 two-byte characters: 200 chars, 400 bytes.
        let text = "é".repeat(200);
        assert!(matches!(chunk(&text, &policy(401)), ChunkedReply::Single(_)));
        assert!(matches!(chunk(&text, &policy(400)), ChunkedReply::Chunks(_)));
    }

    #[test]
    fn long_reply_is_chunked_within_target() {
        let text = long_reply(40);
        let ChunkedReply::Chunks(chunks) = chunk(&text, &policy(480)) else {
            panic!("expected chunks");
        };
        assert!(chunks.len() >= 3);
        for c in &chunks {
            assert!(c.chars().count() <= 450, "chunk too long: {}", c.len());
            assert_eq!(&sanitize(c), c);
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = long_reply(40);
        let ChunkedReply::Chunks(chunks) = chunk(&text, &policy(480)) else {
            panic!("expected chunks");
        };
        for pair in chunks.windows(2) {
            let tail = pair[0].rsplit('.').next().unwrap().trim();
            assert!(
                pair[1].starts_with(tail),
                "{:?} does not start with {:?}",
                pair[1],
                tail
            );
        }
    }

    #[test]
    fn chunks_are_sanitized() {
        let text = format!("{}\n\n\tTrailing words.\n", long_reply(30).replace(". ", ".\n"));
        let ChunkedReply::Chunks(chunks) = chunk(&text, &policy(480)) else {
            panic!("expected chunks");
        };
        for c in &chunks {
            assert!(!c.contains('\n'));
            assert_eq!(&sanitize(c), c);
        }
    }

    #[test]
    fn reply_without_separators_stays_under_limit() {
        let text = "word, ".repeat(117);
        let ChunkedReply::Chunks(chunks) = chunk(&text, &policy(480)) else {
            panic!("expected chunks");
        };
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() < 480, "chunk is {} bytes", c.len());
            assert_eq!(&sanitize(c), c);
        }
        let words: usize = chunks.iter().map(|c| c.matches("word").count()).sum();
        assert_eq!(words, 117);
    }

    #[test]
    fn multibyte_chunks_stay_under_limit() {
        let text = "Охранник стоит у двери хранилища и молчит. ".repeat(40);
        let ChunkedReply::Chunks(chunks) = chunk(&text, &policy(480)) else {
            panic!("expected chunks");
        };
        for c in &chunks {
            assert!(c.len() < 480, "chunk is {} bytes", c.len());
            assert_eq!(&sanitize(c), c);
        }
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let text = "é".repeat(300);
        let pieces = hard_split(&text, 101);
        assert!(pieces.iter().all(|p| p.len() <= 100));
        assert_eq!(pieces.concat(), text);

        assert_eq!(hard_split("ab cd ef", 6), vec!["ab cd", "ef"]);
        assert_eq!(hard_split("€", 2), vec!["€"]);
    }

    #[test]
    fn into_messages_drops_empty() {
        assert!(ChunkedReply::Single(String::new()).into_messages().is_empty());
        assert_eq!(
            ChunkedReply::Chunks(vec!["a".into(), String::new(), "b".into()]).into_messages(),
            vec!["a", "b"]
        );
    }
}
