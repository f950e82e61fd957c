//! Cupido - minimal HTTP/1.1 request ingestion
//!
//! Receives one request per connection, frames and parses its header without
//! copying, streams the declared body, and writes a single response back.

pub mod buffer;
pub mod config;
pub mod http;
pub mod server;
