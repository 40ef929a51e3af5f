//! Incremental line splitting for worker output.
//!
//! Pipe reads arrive in arbitrary chunks: a line may span several chunks
//! and a multi-byte UTF-8 sequence may be cut in half. [`LineSplitter`]
//! buffers raw bytes and only decodes once a full line is assembled.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Lines longer than this are emitted in pieces (1 MiB).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Size of each pipe read.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Turns a byte stream into complete lines.
///
/// Line terminators (`\n` or `\r\n`) are stripped. Invalid UTF-8 is
/// replaced with `U+FFFD`.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            lines.push(self.take_pending());
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);

        while self.pending.len() > MAX_LINE_BYTES {
            let tail = self.pending.split_off(piece_end(&self.pending));
            lines.push(decode(std::mem::replace(&mut self.pending, tail)));
        }

        lines
    }

    /// Flush the unterminated remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_pending())
        }
    }

    fn take_pending(&mut self) -> String {
        let mut line = std::mem::take(&mut self.pending);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        decode(line)
    }
}

/// End of the next over-long piece, moved back so a multi-byte character
/// is never cut. Falls back to the hard cap when the bytes around it are
/// not valid UTF-8 anyway.
fn piece_end(pending: &[u8]) -> usize {
    let is_continuation = |b: u8| b & 0xC0 == 0x80;
    (MAX_LINE_BYTES.saturating_sub(3)..=MAX_LINE_BYTES)
        .rev()
        .find(|&i| i > 0 && !is_continuation(pending[i]))
        .unwrap_or(MAX_LINE_BYTES)
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Read `reader` to EOF, calling `on_line` for each complete line and once
/// more for a trailing unterminated line.
///
/// The remainder is flushed even when a read fails.
pub async fn read_lines<R, F>(mut reader: R, mut on_line: F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(String),
{
    let mut splitter = LineSplitter::new();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];

    let result = loop {
        match reader.read(&mut buf).await {
            Ok(0) => break Ok(()),
            Ok(n) => {
                for line in splitter.push(&buf[..n]) {
                    on_line(line);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(e),
        }
    };

    if let Some(rest) = splitter.finish() {
        on_line(rest);
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut s = LineSplitter::new();
        assert_eq!(s.push(b"A\nB\nC\n"), ["A", "B", "C"]);
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn joins_lines_across_chunks() {
        let mut s = LineSplitter::new();
        assert!(s.push(b"[1/").is_empty());
        assert!(s.push(b"3] row").is_empty());
        assert_eq!(s.push(b" one\n[2/"), ["[1/3] row one"]);
        assert_eq!(s.finish().as_deref(), Some("[2/"));
    }

    #[test]
    fn strips_carriage_returns() {
        let mut s = LineSplitter::new();
        assert_eq!(s.push(b"windows\r\n"), ["windows"]);
        assert_eq!(s.push(b"tail\r"), Vec::<String>::new());
        assert_eq!(s.finish().as_deref(), Some("tail"));
    }

    #[test]
    fn keeps_empty_lines() {
        let mut s = LineSplitter::new();
        assert_eq!(s.push(b"\n\nx\n"), ["", "", "x"]);
    }

    #[test]
    fn multibyte_sequence_split_across_chunks() {
        let bytes = "翻译完成\n".as_bytes();
        let mut s = LineSplitter::new();
        assert!(s.push(&bytes[..2]).is_empty());
        assert!(s.push(&bytes[2..7]).is_empty());
        assert_eq!(s.push(&bytes[7..]), ["翻译完成"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut s = LineSplitter::new();
        assert_eq!(s.push(b"bad \xff byte\n"), ["bad \u{FFFD} byte"]);
    }

    #[test]
    fn overlong_line_is_emitted_in_pieces() {
        let mut s = LineSplitter::new();
        let long = vec![b'x'; MAX_LINE_BYTES + 10];
        let lines = s.push(&long);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
        assert_eq!(s.finish().map(|l| l.len()), Some(10));
    }

    #[test]
    fn overlong_line_is_not_cut_inside_a_character() {
        let mut s = LineSplitter::new();
        let mut long = vec![b'a'; MAX_LINE_BYTES - 1];
        long.extend_from_slice("翻译".as_bytes());

        let lines = s.push(&long);
        let rest = s.finish().expect("remainder");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES - 1);
        assert_eq!(rest, "翻译");
        assert!(!lines[0].contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn read_lines_flushes_unterminated_tail() {
        let input: &[u8] = b"first\nsecond\nno newline";
        let mut seen = Vec::new();
        read_lines(input, |line| seen.push(line))
            .await
            .expect("read");
        assert_eq!(seen, ["first", "second", "no newline"]);
    }

    #[tokio::test]
    async fn read_lines_on_empty_stream() {
        let input: &[u8] = b"";
        let mut seen = Vec::new();
        read_lines(input, |line| seen.push(line))
            .await
            .expect("read");
        assert!(seen.is_empty());
    }
}
