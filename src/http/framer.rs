use crate::buffer::{ByteBuffer, View};

/// Empty line ending the header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Outcome of a framing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// No header terminator yet; receive more and try again.
    Incomplete,
    /// `header` spans the request line and field lines without the
    /// terminator, `body` is whatever followed it (possibly empty).
    Complete { header: View, body: View },
}

/// Locates the header/body boundary in a buffer that keeps growing.
///
/// The framer remembers how far it has already scanned and resumes a few
/// bytes before that point, so a terminator straddling two reads is found
/// without rescanning the whole header each time.
#[derive(Debug, Default)]
pub struct Framer {
    scanned: usize,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&mut self, buf: &ByteBuffer) -> Framing {
        let start = self.scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);

        match buf.find_from(start, HEADER_TERMINATOR) {
            Some(at) => {
                let body_start = at + HEADER_TERMINATOR.len();
                Framing::Complete {
                    header: buf.slice(0, at),
                    body: buf.slice(body_start, buf.len() - body_start),
                }
            }
            None => {
                self.scanned = buf.len();
                Framing::Incomplete
            }
        }
    }
}
