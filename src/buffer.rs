//! Growable receive buffer with zero-copy views.
//!
//! [`ByteBuffer`] accumulates bytes as they arrive from the network. Tokens are
//! handed out as [`View`]s, which are plain `(offset, len)` windows stamped
//! with the buffer generation they were cut from. Every reallocation bumps the
//! generation, so a view that survived a growth is detected instead of being
//! silently resolved against moved storage.

use bytes::BytesMut;

/// A read-only window into a [`ByteBuffer`].
///
/// A view never owns memory. Resolve it with [`ByteBuffer::get`] on the same
/// buffer it was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct View {
    generation: u64,
    offset: usize,
    len: usize,
}

impl View {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Returns the view shifted forward by `step` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `step` is larger than the view.
    pub fn advance(self, step: usize) -> View {
        assert!(step <= self.len, "advance {} past view of {} bytes", step, self.len);
        View {
            generation: self.generation,
            offset: self.offset + step,
            len: self.len - step,
        }
    }

    /// Keeps the first `at` bytes of the view.
    pub fn chop(self, at: usize) -> View {
        assert!(at <= self.len, "chop at {} past view of {} bytes", at, self.len);
        View { len: at, ..self }
    }

    /// Splits the view into `[0, at)` and `[at, len)`.
    pub fn split_at(self, at: usize) -> (View, View) {
        (self.chop(at), self.advance(at))
    }
}

/// Owned, growable byte region.
///
/// `len() <= capacity()` always holds. Growth reserves roughly 1.5x the
/// required size so that a header arriving in many small reads does not
/// reallocate on every append.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: BytesMut,
    generation: u64,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Number of reallocations so far. Views carry the value current at the
    /// time they were issued.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Appends `bytes`, growing the allocation when needed.
    ///
    /// Growth invalidates every view issued so far. Allocation failure aborts
    /// the process.
    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let target = self.data.len() + bytes.len();
        if target > self.data.capacity() {
            let headroom = target + target / 2;
            self.data.reserve(headroom - self.data.len());
            self.generation += 1;
        }

        self.data.extend_from_slice(bytes);
    }

    /// Offset of the first occurrence of `delimiter` in the written region.
    ///
    /// The search always runs over the whole accumulated content, so a
    /// delimiter split across two appends is still found.
    pub fn find(&self, delimiter: &[u8]) -> Option<usize> {
        self.find_from(0, delimiter)
    }

    /// Like [`find`](Self::find), starting the scan at `start`.
    pub fn find_from(&self, start: usize, delimiter: &[u8]) -> Option<usize> {
        find_bytes(self.data.get(start..)?, delimiter).map(|at| at + start)
    }

    /// Issues a view over `[offset, offset + len)`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the written region.
    pub fn slice(&self, offset: usize, len: usize) -> View {
        let end = offset.saturating_add(len);
        assert!(
            end <= self.data.len(),
            "slice {}..{} out of bounds for buffer of {} bytes",
            offset,
            end,
            self.data.len()
        );

        View {
            generation: self.generation,
            offset,
            len,
        }
    }

    /// View over everything written so far.
    pub fn full(&self) -> View {
        self.slice(0, self.data.len())
    }

    /// Resolves a view into bytes.
    ///
    /// # Panics
    ///
    /// Panics if the view was issued before the last growth.
    pub fn get(&self, view: View) -> &[u8] {
        match self.try_get(view) {
            Some(bytes) => bytes,
            None => panic!(
                "stale view (generation {}) used on buffer generation {}",
                view.generation, self.generation
            ),
        }
    }

    /// Resolves a view, or `None` if it is stale or out of bounds.
    pub fn try_get(&self, view: View) -> Option<&[u8]> {
        if view.generation != self.generation {
            return None;
        }
        self.data.get(view.offset..view.end())
    }

    /// Offset, relative to the view, of the first `delimiter` inside it.
    pub fn find_in(&self, view: View, delimiter: &[u8]) -> Option<usize> {
        find_bytes(self.get(view), delimiter)
    }

    /// Splits `view` around the first `delimiter`, dropping the delimiter.
    pub fn split(&self, view: View, delimiter: &[u8]) -> Option<(View, View)> {
        let at = self.find_in(view, delimiter)?;
        let (head, rest) = view.split_at(at);
        Some((head, rest.advance(delimiter.len())))
    }

    pub fn starts_with(&self, view: View, prefix: &[u8]) -> bool {
        self.get(view).starts_with(prefix)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        let mut buffer = ByteBuffer::new();
        buffer.append(bytes);
        buffer
    }
}

impl<const N: usize> From<&[u8; N]> for ByteBuffer {
    fn from(bytes: &[u8; N]) -> Self {
        ByteBuffer::from(&bytes[..])
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
