//! HTTP protocol implementation.
//!
//! This module implements a one-request-per-connection HTTP/1.1 server.
//!
//! # Architecture
//!
//! - **`framer`**: Locates the end of the header block in a growing buffer
//! - **`parser`**: Tokenizes the request line and header fields into views
//! - **`request`**: Parsed request representation
//! - **`session`**: Receive loop feeding the framer, plus body streaming
//! - **`connection`**: The connection handler implementing the request-response state machine
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: Content-Type classification
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine exactly once:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Receive header, then the declared body
//!        └──────┬──────┘
//!               │ Request received          (error → Closed, nothing sent)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Handler generates the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cupido::config::ServerConfig;
//! use cupido::http::connection::Connection;
//! use cupido::http::response::Response;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = ServerConfig::default();
//!     let handler = Arc::new(|_req: &_| Response::ok("hi"));
//!     let listener = TcpListener::bind(&cfg.listen_addr).await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let mut conn = Connection::new(socket, handler.clone(), &cfg);
//!         tokio::spawn(async move {
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod framer;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod session;
pub mod writer;
