//! Line scanner for submission files
//!
//! Splits a decompressed stream on `\n`. Line numbers are 1-based and the
//! header is line 1. The cancellation token is polled every 10,000 lines.

use std::io::{BufRead, BufReader, Read};

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::errors::{CheckError, CheckResult};
use crate::observability::Event;

/// Lines between two cancellation polls
pub const CANCELLATION_POLL_INTERVAL: u64 = 10_000;

/// Lines between two progress log entries
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000_000;

/// One physical line, without its terminator
#[derive(Debug, Clone, Copy)]
pub struct ScannedLine<'a> {
    pub number: u64,
    pub bytes: &'a [u8],
    /// False only for a final line that ends without `\n`
    pub terminated: bool,
}

/// Streaming line reader with cancellation polling
pub struct RowScanner<R: Read> {
    file_name: String,
    reader: BufReader<R>,
    buffer: Vec<u8>,
    line: u64,
    cancel: CancellationToken,
}

impl<R: Read> RowScanner<R> {
    pub fn new(file_name: impl Into<String>, reader: R, cancel: CancellationToken) -> Self {
        Self {
            file_name: file_name.into(),
            reader: BufReader::with_capacity(64 * 1024, reader),
            buffer: Vec::with_capacity(4096),
            line: 0,
            cancel,
        }
    }

    /// Lines returned so far
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    /// Reads the next line, `None` at end of stream
    pub fn next_line(&mut self) -> CheckResult<Option<ScannedLine<'_>>> {
        self.buffer.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .map_err(|e| CheckError::io(&self.file_name, e))?;
        if read == 0 {
            return Ok(None);
        }

        self.line += 1;
        if self.line % CANCELLATION_POLL_INTERVAL == 0 && self.cancel.is_cancelled() {
            return Err(CheckError::Cancelled);
        }
        if self.line % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                event = Event::RowScanProgress.as_str(),
                file = %self.file_name,
                lines = self.line,
                "scanning"
            );
        }

        let terminated = self.buffer.last() == Some(&b'\n');
        let end = if terminated {
            self.buffer.len() - 1
        } else {
            self.buffer.len()
        };

        Ok(Some(ScannedLine {
            number: self.line,
            bytes: &self.buffer[..end],
            terminated,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scanner(content: &str) -> RowScanner<Cursor<Vec<u8>>> {
        RowScanner::new("donor.txt", Cursor::new(content.as_bytes().to_vec()), CancellationToken::new())
    }

    #[test]
    fn test_lines_numbered_from_one() {
        let mut scanner = scanner("a\tb\nc\td\n");
        let first = scanner.next_line().unwrap().unwrap();
        assert_eq!((first.number, first.bytes, first.terminated), (1, &b"a\tb"[..], true));
        let second = scanner.next_line().unwrap().unwrap();
        assert_eq!(second.number, 2);
        assert!(scanner.next_line().unwrap().is_none());
    }

    #[test]
    fn test_unterminated_last_line() {
        let mut scanner = scanner("a\nb");
        scanner.next_line().unwrap();
        let last = scanner.next_line().unwrap().unwrap();
        assert_eq!(last.bytes, b"b");
        assert!(!last.terminated);
    }

    #[test]
    fn test_empty_line_kept() {
        let mut scanner = scanner("a\n\nb\n");
        scanner.next_line().unwrap();
        let empty = scanner.next_line().unwrap().unwrap();
        assert!(empty.bytes.is_empty());
        assert_eq!(empty.number, 2);
    }

    #[test]
    fn test_cancellation_polled() {
        let token = CancellationToken::new();
        token.cancel();
        let content = "x\n".repeat(CANCELLATION_POLL_INTERVAL as usize + 5);
        let mut scanner = RowScanner::new("big.txt", Cursor::new(content.into_bytes()), token);

        let mut seen = 0;
        let err = loop {
            match scanner.next_line() {
                Ok(Some(_)) => seen += 1,
                Ok(None) => panic!("scan finished despite cancellation"),
                Err(e) => break e,
            }
        };
        assert!(err.is_cancelled());
        assert_eq!(seen, CANCELLATION_POLL_INTERVAL - 1);
    }
}
