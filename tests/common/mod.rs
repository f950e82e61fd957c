//! Scripted in-memory stream for driving sessions through exact read
//! boundaries, would-block signals and short writes.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub enum Step {
    Data(Vec<u8>),
    WouldBlock,
    Fail(io::ErrorKind),
}

/// Serves one scripted step per read call, then EOF.
#[derive(Default)]
pub struct ScriptedStream {
    steps: VecDeque<Step>,
    pub reads: usize,
    pub written: Vec<u8>,
    /// Caps every write at this many bytes when set
    pub max_write: Option<usize>,
    /// Number of writes that answer would-block before accepting data
    pub blocked_writes: usize,
    /// Report a closed peer (zero-length write) instead of accepting data
    pub closed_for_writes: bool,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.steps.push_back(Step::Data(bytes.to_vec()));
        self
    }

    pub fn would_block(mut self) -> Self {
        self.steps.push_back(Step::WouldBlock);
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push_back(Step::Fail(kind));
        self
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reads += 1;

        match self.steps.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.remaining());
                buf.put_slice(&bytes[..n]);
                if n < bytes.len() {
                    let rest = bytes.split_off(n);
                    self.steps.push_front(Step::Data(rest));
                }
                Poll::Ready(Ok(()))
            }
            Some(Step::WouldBlock) => Poll::Ready(Err(io::ErrorKind::WouldBlock.into())),
            Some(Step::Fail(kind)) => Poll::Ready(Err(kind.into())),
            None => Poll::Ready(Ok(())),
        }
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.closed_for_writes {
            return Poll::Ready(Ok(0));
        }

        if self.blocked_writes > 0 {
            self.blocked_writes -= 1;
            return Poll::Ready(Err(io::ErrorKind::WouldBlock.into()));
        }

        let n = self.max_write.map_or(buf.len(), |max| buf.len().min(max));
        self.written.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Server settings with a small read quota.
pub fn small_config(recv_chunk_size: usize) -> cupido::config::ServerConfig {
    cupido::config::ServerConfig {
        recv_chunk_size,
        ..Default::default()
    }
}
