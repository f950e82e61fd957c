use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::{Config, ServerConfig};
use crate::http::connection::{Connection, Handler};
use crate::server::pool::SessionPool;

/// Pause after a failed accept, so a persistent failure such as descriptor
/// exhaustion does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Source of incoming connections.
pub trait Accept: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

pub async fn run<H: Handler>(cfg: &Config, handler: Arc<H>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", cfg.server.listen_addr);

    serve(listener, cfg.server.clone(), handler).await
}

/// Accepts connections forever, one task per connection.
///
/// When every session slot is taken the new connection is logged and closed
/// straight away; connections already being served are not affected. A failed
/// accept is logged and the loop carries on.
pub async fn serve<A, H>(mut listener: A, cfg: ServerConfig, handler: Arc<H>) -> anyhow::Result<()>
where
    A: Accept,
    H: Handler,
{
    let pool = SessionPool::new(cfg.max_clients);

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let Some(slot) = pool.try_claim() else {
            warn!(%peer, capacity = pool.capacity(), "No free session slot, rejecting connection");
            drop(socket);
            continue;
        };

        info!(%peer, slot = slot.index(), "Accepted connection");

        let handler = Arc::clone(&handler);
        let cfg = cfg.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, handler, &cfg).with_slot(slot);
            // Already reported by the connection.
            if let Err(e) = conn.run().await {
                debug!(%peer, error = %e, "Connection ended with error");
            }
        });
    }
}
