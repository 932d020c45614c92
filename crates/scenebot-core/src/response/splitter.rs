//! Separator-based text splitting with overlapping windows.

use std::collections::VecDeque;

/// Split `text` on `separator` and pack the pieces into chunks.
///
/// Pieces are appended to a window until the next one would push the window
/// past `chunk_size` characters (separators included). The window is then
/// emitted and pieces are dropped from its front until at most
/// `chunk_overlap` characters remain, so the next chunk repeats the tail of
/// the previous one. A single piece longer than `chunk_size` becomes its own
/// oversized chunk. Chunks are whitespace-trimmed; empty ones are skipped.
pub(crate) fn split_text(
    text: &str,
    separator: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let separator_len = separator.chars().count();
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in text.split(separator).filter(|p| !p.is_empty()) {
        let len = piece.chars().count();

        if total + len + joint(&window, separator_len) > chunk_size && !window.is_empty() {
            if total > chunk_size {
                tracing::debug!(total, chunk_size, "Emitting chunk longer than target");
            }
            if let Some(chunk) = join(&window, separator) {
                chunks.push(chunk);
            }
            while total > chunk_overlap
                || (total > 0 && total + len + joint(&window, separator_len) > chunk_size)
            {
                let Some(front) = window.pop_front() else {
                    break;
                };
                let dropped = front.chars().count() + joint(&window, separator_len);
                total = total.saturating_sub(dropped);
            }
        }

        total += len + joint(&window, separator_len);
        window.push_back(piece);
    }

    if let Some(chunk) = join(&window, separator) {
        chunks.push(chunk);
    }
    chunks
}

/// Separator length contributed by appending to `window`.
fn joint(window: &VecDeque<&str>, separator_len: usize) -> usize {
    if window.is_empty() { 0 } else { separator_len }
}

fn join(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("a. b. c", ".", 100, 10), vec!["a. b. c"]);
    }

    #[test]
    fn packs_up_to_chunk_size() {
        // "aaaa" pieces of 4 chars joined by "." -> 4, 9, 14 ...
        let chunks = split_text("aaaa.bbbb.cccc.dddd", ".", 9, 0);
        assert_eq!(chunks, vec!["aaaa.bbbb", "cccc.dddd"]);
    }

    #[test]
    fn overlap_carries_trailing_pieces() {
        let chunks = split_text("aaaa.bbbb.cccc.dddd", ".", 9, 4);
        assert_eq!(chunks, vec!["aaaa.bbbb", "bbbb.cccc", "cccc.dddd"]);
    }

    #[test]
    fn oversized_piece_stands_alone() {
        let chunks = split_text("aa.bbbbbbbbbbbb.cc", ".", 5, 0);
        assert_eq!(chunks, vec!["aa", "bbbbbbbbbbbb", "cc"]);
    }

    #[test]
    fn empty_pieces_and_blank_chunks_are_skipped() {
        assert_eq!(split_text("..a..b..", ".", 100, 0), vec!["a.b"]);
        assert!(split_text("...", ".", 10, 0).is_empty());
        assert!(split_text("", ".", 10, 0).is_empty());
    }
}
