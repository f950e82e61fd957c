//! Receive side of a connection.
//!
//! A [`Session`] feeds bytes from one connection into a [`ByteBuffer`] until
//! the [`Framer`] finds the end of the header, parses the header exactly once,
//! then streams the declared body to a caller-supplied destination.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::buffer::ByteBuffer;
use crate::config::ServerConfig;
use crate::http::framer::{Framer, Framing};
use crate::http::parser::{self, ParseError};
use crate::http::request::{Request, RequestState};
use crate::http::writer::is_transient;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("peer closed the connection")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("body truncated: received {received} of {expected} bytes")]
    TruncatedBody { expected: u64, received: u64 },

    #[error("request header already parsed on this connection")]
    AlreadyParsed,

    #[error("request header already rejected on this connection")]
    AlreadyRejected,
}

pub struct Session<IO> {
    io: IO,
    buffer: ByteBuffer,
    framer: Framer,
    state: RequestState,
    connected: bool,
    scratch: Box<[u8]>,
    max_header_bytes: usize,
    max_body_bytes: u64,
}

impl<IO> Session<IO> {
    pub fn new(io: IO, cfg: &ServerConfig) -> Self {
        Self {
            io,
            buffer: ByteBuffer::with_capacity(cfg.recv_chunk_size),
            framer: Framer::new(),
            state: RequestState::AwaitingHeader,
            connected: true,
            scratch: vec![0u8; cfg.recv_chunk_size.max(1)].into_boxed_slice(),
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}

impl<IO> Session<IO>
where
    IO: AsyncRead + Unpin,
{
    /// Receives until the header block is complete and parses it.
    ///
    /// Any body bytes that arrived with the header are kept on the request
    /// (see [`Request::body_prefix`]); use [`read_body`](Self::read_body)
    /// for the rest.
    ///
    /// Any protocol error, including a declared body above `max_body_bytes`,
    /// leaves the session in [`RequestState::Rejected`].
    pub async fn read_request(&mut self) -> Result<Request, SessionError> {
        match self.state {
            RequestState::HeaderParsed => return Err(SessionError::AlreadyParsed),
            RequestState::Rejected => return Err(SessionError::AlreadyRejected),
            RequestState::AwaitingHeader => {}
        }

        let result = self.receive_head().await;
        if let Err(SessionError::Protocol(_)) = &result {
            self.state = RequestState::Rejected;
        }
        result
    }

    async fn receive_head(&mut self) -> Result<Request, SessionError> {
        loop {
            if let Framing::Complete { header, body } = self.framer.frame(&self.buffer) {
                let head = parser::parse_head(&self.buffer, header)?;

                let limit = self.max_body_bytes;
                if let Some(declared) = head.content_length.filter(|&n| n > limit) {
                    return Err(ParseError::BodyTooLarge {
                        declared,
                        max_size: limit,
                    }
                    .into());
                }

                self.state = RequestState::HeaderParsed;

                debug!(
                    method = head.method.as_str(),
                    header_bytes = header.len(),
                    body_prefix = body.len(),
                    "Request header parsed"
                );

                let raw = std::mem::take(&mut self.buffer);
                return Ok(Request::from_head(raw, head, body));
            }

            if self.buffer.len() > self.max_header_bytes {
                return Err(ParseError::HeaderTooLarge {
                    current_size: self.buffer.len(),
                    max_size: self.max_header_bytes,
                }
                .into());
            }

            let quota = self.scratch.len();
            let n = self.receive(quota).await?;
            self.buffer.append(&self.scratch[..n]);
        }
    }

    /// Streams the declared body into `dst` and returns the number of bytes
    /// delivered.
    ///
    /// Without a positive `Content-Length` this returns at once without
    /// touching the connection. Bytes past the declared length are dropped.
    pub async fn read_body<W>(&mut self, request: &Request, dst: &mut W) -> Result<u64, SessionError>
    where
        W: AsyncWrite + Unpin,
    {
        let expected = request.expected_body_len();
        if expected == 0 {
            return Ok(0);
        }

        let prefix = request.body_prefix();
        let take = prefix.len().min(usize::try_from(expected).unwrap_or(usize::MAX));
        if prefix.len() > take {
            warn!(
                discarded = prefix.len() - take,
                "Discarding bytes past declared content length"
            );
        }

        dst.write_all(&prefix[..take]).await?;
        let mut received = take as u64;

        while received < expected {
            let remaining = expected - received;
            let quota = self.scratch.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));

            let n = match self.receive(quota).await {
                Ok(n) => n,
                Err(SessionError::Closed) => {
                    warn!(expected, received, "Peer closed before the full body arrived");
                    return Err(SessionError::TruncatedBody { expected, received });
                }
                Err(e) => return Err(e),
            };

            dst.write_all(&self.scratch[..n]).await?;
            received += n as u64;
        }

        dst.flush().await?;
        Ok(received)
    }

    /// One receive call of at most `quota` bytes into the scratch area.
    async fn receive(&mut self, quota: usize) -> Result<usize, SessionError> {
        loop {
            match self.io.read(&mut self.scratch[..quota]).await {
                Ok(0) => {
                    self.connected = false;
                    return Err(SessionError::Closed);
                }
                Ok(n) => {
                    trace!(bytes = n, "Received");
                    return Ok(n);
                }
                Err(e) if is_transient(&e) => tokio::task::yield_now().await,
                Err(e) => {
                    self.connected = false;
                    return Err(e.into());
                }
            }
        }
    }
}
