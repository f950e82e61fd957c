use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::buffer::ByteBuffer;
use crate::http::parser::CRLF;
use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Default amount handed to a single write call.
pub const DEFAULT_SEND_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection closed while writing")]
    Closed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Starts a response header with the status line.
pub fn create_header(status: StatusCode) -> ByteBuffer {
    let mut buf = ByteBuffer::with_capacity(256);
    let status_line = format!(
        "{} {} {}",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.append(status_line.as_bytes());
    buf.append(CRLF);
    buf
}

/// Appends one `Key: Value` field line.
pub fn append_field(buf: &mut ByteBuffer, field: &str) {
    buf.append(field.as_bytes());
    buf.append(CRLF);
}

/// Closes the header block with the empty line.
pub fn finish(buf: &mut ByteBuffer) {
    buf.append(CRLF);
}

/// Writes all of `bytes`, at most `chunk_size` per write call.
///
/// A zero-length write means the peer is gone. Would-block and interrupted
/// writes are retried from where they left off.
pub async fn send_all<W>(stream: &mut W, bytes: &[u8], chunk_size: usize) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    send_from(stream, bytes, &mut written, chunk_size).await?;
    stream.flush().await?;
    Ok(())
}

async fn send_from<W>(
    stream: &mut W,
    bytes: &[u8],
    written: &mut usize,
    chunk_size: usize,
) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    let chunk_size = chunk_size.max(1);

    while *written < bytes.len() {
        let end = bytes.len().min(*written + chunk_size);

        match stream.write(&bytes[*written..end]).await {
            Ok(0) => return Err(SendError::Closed),
            Ok(n) => *written += n,
            Err(e) if is_transient(&e) => tokio::task::yield_now().await,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

pub(crate) fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn serialize_response(resp: &Response) -> ByteBuffer {
    let mut buf = create_header(resp.status);

    for (k, v) in &resp.headers {
        append_field(&mut buf, &format!("{}: {}", k, v));
    }

    finish(&mut buf);

    buf.append(&resp.body);

    buf
}

/// A serialized response plus how much of it has reached the peer.
pub struct ResponseWriter {
    buffer: ByteBuffer,
    written: usize,
    chunk_size: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
            chunk_size: DEFAULT_SEND_CHUNK,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn is_done(&self) -> bool {
        self.written == self.buffer.len()
    }

    /// Sends the remaining bytes. Progress survives an error, so a retry
    /// resumes rather than resending.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin,
    {
        send_from(stream, self.buffer.as_slice(), &mut self.written, self.chunk_size).await?;
        stream.flush().await?;
        Ok(())
    }
}
