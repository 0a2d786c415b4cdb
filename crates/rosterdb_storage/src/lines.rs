//! Lazy line scanning with offset tracking.

use crate::backend::strip_terminator;
use crate::error::StorageResult;
use std::io::BufRead;

/// A single non-empty line read from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Byte offset at which the line starts.
    pub offset: u64,
    /// Line content without its terminator.
    pub bytes: Vec<u8>,
}

/// Iterator over the non-empty lines of a backend.
///
/// The running offset advances by the exact number of bytes consumed for
/// every line, blank ones included, so the offsets of later lines always
/// match their position in the underlying data.
pub struct LineIter {
    reader: Box<dyn BufRead + Send>,
    offset: u64,
    done: bool,
}

impl LineIter {
    /// Creates an iterator that starts at offset 0 of `reader`.
    pub fn new(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Returns the offset just past the last consumed byte.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.offset
    }
}

impl Iterator for LineIter {
    type Item = StorageResult<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let mut buf = Vec::new();
            let consumed = match self.reader.read_until(b'\n', &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };

            if consumed == 0 {
                self.done = true;
                return None;
            }

            let start = self.offset;
            self.offset += consumed as u64;

            strip_terminator(&mut buf);
            if buf.is_empty() {
                continue;
            }

            return Some(Ok(Line {
                offset: start,
                bytes: buf,
            }));
        }
    }
}

impl std::fmt::Debug for LineIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineIter")
            .field("offset", &self.offset)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(data: &[u8]) -> Vec<Line> {
        LineIter::new(Box::new(Cursor::new(data.to_vec())))
            .collect::<StorageResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn offsets_follow_bytes() {
        let lines = scan(b"ab\ncde\nf\n");
        let offsets: Vec<u64> = lines.iter().map(|l| l.offset).collect();
        assert_eq!(offsets, vec![0, 3, 7]);
        assert_eq!(lines[1].bytes, b"cde");
    }

    #[test]
    fn blank_lines_skipped_but_counted() {
        let lines = scan(b"\nab\n\r\n\ncd\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].offset, 1);
        assert_eq!(lines[1].offset, 7);
        assert_eq!(lines[1].bytes, b"cd");
    }

    #[test]
    fn crlf_terminators_stripped() {
        let lines = scan(b"ab\r\ncd\r\n");
        assert_eq!(lines[0].bytes, b"ab");
        assert_eq!(lines[1].offset, 4);
    }

    #[test]
    fn last_line_without_terminator() {
        let mut iter = LineIter::new(Box::new(Cursor::new(b"ab\ncd".to_vec())));
        let _ = iter.next();
        let last = iter.next().unwrap().unwrap();
        assert_eq!(last.offset, 3);
        assert_eq!(last.bytes, b"cd");
        assert!(iter.next().is_none());
        assert_eq!(iter.position(), 5);
    }

    #[test]
    fn empty_input() {
        assert!(scan(b"").is_empty());
        assert!(scan(b"\n\n\n").is_empty());
    }
}
