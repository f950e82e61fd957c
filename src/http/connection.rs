use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::session::{Session, SessionError};
use crate::http::writer::ResponseWriter;
use crate::server::pool::Slot;

/// Decides the response for a fully received request.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

pub struct Connection<IO, H> {
    session: Session<IO>,
    handler: Arc<H>,
    send_chunk_size: usize,
    slot: Option<Slot>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<IO, H> Connection<IO, H>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    pub fn new(stream: IO, handler: Arc<H>, cfg: &ServerConfig) -> Self {
        Self {
            session: Session::new(stream, cfg),
            handler,
            send_chunk_size: cfg.send_chunk_size,
            slot: None,
            state: ConnectionState::Reading,
        }
    }

    /// Ties the connection to a pool slot, released when the connection drops.
    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn slot_index(&self) -> Option<usize> {
        self.slot.as_ref().map(Slot::index)
    }

    /// Runs one request/response cycle, then shuts the stream down.
    ///
    /// A protocol or transport error ends the connection without sending
    /// anything; the error is returned to the caller.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await {
                    Ok(Some(req)) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    Ok(None) => {
                        self.state = ConnectionState::Closed;
                    }
                    Err(e) => {
                        self.state = ConnectionState::Closed;
                        warn!(slot = ?self.slot_index(), error = %e, "Dropping connection");
                        return Err(e.into());
                    }
                },

                ConnectionState::Processing(req) => {
                    let response = self.handler.handle(req);
                    let slot = self.slot.as_ref().map(Slot::index);

                    info!(
                        slot = ?slot,
                        method = req.method.as_str(),
                        path = %String::from_utf8_lossy(req.path()),
                        status = response.status.as_u16(),
                        "Responding"
                    );

                    let writer = ResponseWriter::new(&response).with_chunk_size(self.send_chunk_size);
                    self.state = ConnectionState::Writing(writer);
                }

                ConnectionState::Writing(writer) => {
                    if let Err(e) = writer.write_to_stream(self.session.io_mut()).await {
                        self.state = ConnectionState::Closed;
                        warn!(slot = ?self.slot_index(), error = %e, "Failed to send response");
                        return Err(e.into());
                    }
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        // The peer may already be gone; nothing left to report.
        let _ = self.session.io_mut().shutdown().await;

        Ok(())
    }

    /// Reads the header and the declared body. `None` when the peer closed
    /// before sending a complete header.
    async fn read_request(&mut self) -> Result<Option<Request>, SessionError> {
        let mut req = match self.session.read_request().await {
            Ok(req) => req,
            Err(SessionError::Closed) => {
                debug!(slot = ?self.slot_index(), "Peer closed before sending a request");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let capacity = usize::try_from(req.expected_body_len()).unwrap_or(0).min(1 << 20);
        let mut body = Vec::with_capacity(capacity);
        self.session.read_body(&req, &mut body).await?;
        req.body = body.into();

        Ok(Some(req))
    }
}
