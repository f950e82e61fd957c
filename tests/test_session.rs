mod common;

use std::io;
use std::time::Duration;

use common::{ScriptedStream, small_config};
use cupido::config::ServerConfig;
use cupido::http::mime::Mime;
use cupido::http::parser::ParseError;
use cupido::http::request::{Method, RequestState};
use cupido::http::session::{Session, SessionError};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn test_session_single_chunk_get() {
    let stream = ScriptedStream::new().data(b"GET /index HTTP/1.1\r\nContent-Type: text/html\r\n\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();

    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path(), b"/index");
    assert_eq!(req.protocol(), b"HTTP/1.1");
    assert_eq!(req.content_type, Some(Mime::TextHtml));
    assert_eq!(req.content_length, None);
    assert_eq!(session.state(), RequestState::HeaderParsed);
}

#[tokio::test]
async fn test_session_header_split_across_reads() {
    let stream = ScriptedStream::new()
        .data(b"POST /up HTTP/1.1\r\nContent-Le")
        .data(b"ngth: 5\r\n\r\nhello");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path(), b"/up");
    assert_eq!(req.content_length, Some(5));

    let mut body = Vec::new();
    let n = session.read_body(&req, &mut body).await.unwrap();
    assert_eq!(n, 5);
    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn test_session_one_byte_reads() {
    let raw = b"POST /up HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let mut stream = ScriptedStream::new();
    for byte in raw {
        stream = stream.data(&[*byte]);
    }
    let mut session = Session::new(stream, &small_config(1));

    let req = session.read_request().await.unwrap();
    assert_eq!(req.content_length, Some(5));
    assert!(req.body_prefix().is_empty());

    let mut body = Vec::new();
    session.read_body(&req, &mut body).await.unwrap();
    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn test_session_body_streamed_in_quota_sized_reads() {
    let body: Vec<u8> = (0..100u8).collect();
    let stream = ScriptedStream::new()
        .data(b"POST /up HTTP/1.1\r\nContent-Length: 100\r\n\r\n")
        .data(&body[..30])
        .data(&body[30..]);
    let mut session = Session::new(stream, &small_config(16));

    let req = session.read_request().await.unwrap();
    let mut received = Vec::new();
    let n = session.read_body(&req, &mut received).await.unwrap();

    assert_eq!(n, 100);
    assert_eq!(received, body);
}

#[tokio::test]
async fn test_session_would_block_is_retried() {
    let stream = ScriptedStream::new()
        .would_block()
        .data(b"GET / HTTP/1.1\r\n")
        .would_block()
        .would_block()
        .data(b"\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();
    assert_eq!(req.path(), b"/");
}

#[tokio::test]
async fn test_session_peer_closed_before_header() {
    let stream = ScriptedStream::new().data(b"GET / HTTP/1.1\r\nHost: a");
    let mut session = Session::new(stream, &ServerConfig::default());

    let result = session.read_request().await;
    assert!(matches!(result, Err(SessionError::Closed)));
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_session_hard_socket_error() {
    let stream = ScriptedStream::new()
        .data(b"GET / HTTP/1.1\r\n")
        .fail(io::ErrorKind::ConnectionReset);
    let mut session = Session::new(stream, &ServerConfig::default());

    let result = session.read_request().await;
    match result {
        Err(SessionError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected io error, got {:?}", other),
    }
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_session_unsupported_method() {
    let stream = ScriptedStream::new().data(b"PATCH / HTTP/1.1\r\n\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    let result = session.read_request().await;
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ParseError::InvalidMethod))
    ));
    assert_eq!(session.state(), RequestState::Rejected);
}

#[tokio::test]
async fn test_session_no_reentry_after_rejected_header() {
    let stream = ScriptedStream::new().data(b"GET / HTTP/1.0\r\n\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    let first = session.read_request().await;
    assert!(matches!(
        first,
        Err(SessionError::Protocol(ParseError::InvalidVersion))
    ));

    let reads = session.io_mut().reads;
    let again = session.read_request().await;

    assert!(matches!(again, Err(SessionError::AlreadyRejected)));
    assert_eq!(session.state(), RequestState::Rejected);
    assert_eq!(session.io_mut().reads, reads);
}

#[tokio::test]
async fn test_session_declared_body_over_limit() {
    let stream = ScriptedStream::new()
        .data(b"POST /up HTTP/1.1\r\nContent-Length: 1000000000000\r\n\r\n")
        .data(&[b'x'; 4096]);
    let mut session = Session::new(stream, &ServerConfig::default());

    let result = session.read_request().await;
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ParseError::BodyTooLarge {
            declared: 1_000_000_000_000,
            max_size: 67_108_864,
        }))
    ));
    assert_eq!(session.state(), RequestState::Rejected);
    // Only the header chunk was consumed.
    assert_eq!(session.io_mut().reads, 1);
}

#[tokio::test]
async fn test_session_declared_body_at_limit_accepted() {
    let cfg = ServerConfig {
        max_body_bytes: 5,
        ..Default::default()
    };
    let stream = ScriptedStream::new().data(b"POST /up HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
    let mut session = Session::new(stream, &cfg);

    let req = session.read_request().await.unwrap();
    let mut body = Vec::new();
    session.read_body(&req, &mut body).await.unwrap();

    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn test_session_truncated_body() {
    let stream = ScriptedStream::new()
        .data(b"POST /up HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel")
        .data(b"lo");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();
    let mut body = Vec::new();
    let result = session.read_body(&req, &mut body).await;

    assert!(matches!(
        result,
        Err(SessionError::TruncatedBody { expected: 10, received: 5 })
    ));
    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn test_session_content_length_zero_never_reads_body() {
    let stream = ScriptedStream::new().data(b"POST /up HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();
    let reads_after_header = session.io_mut().reads;

    let mut body = Vec::new();
    let n = session.read_body(&req, &mut body).await.unwrap();

    assert_eq!(n, 0);
    assert!(body.is_empty());
    assert_eq!(session.io_mut().reads, reads_after_header);
}

#[tokio::test]
async fn test_session_content_length_zero_on_open_connection() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut session = Session::new(server, &ServerConfig::default());

    client
        .write_all(b"POST /up HTTP/1.1\r\nContent-Length: 0\r\n\r\n")
        .await
        .unwrap();

    let req = session.read_request().await.unwrap();
    let mut body = Vec::new();

    // The client never closes; a body read would hang.
    let n = tokio::time::timeout(Duration::from_secs(1), session.read_body(&req, &mut body))
        .await
        .expect("read_body must not wait for data")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_session_excess_bytes_past_content_length_dropped() {
    let stream = ScriptedStream::new().data(b"POST /up HTTP/1.1\r\nContent-Length: 2\r\n\r\nhiEXTRA");
    let mut session = Session::new(stream, &ServerConfig::default());

    let req = session.read_request().await.unwrap();
    let mut body = Vec::new();
    session.read_body(&req, &mut body).await.unwrap();

    assert_eq!(body, b"hi");
}

#[tokio::test]
async fn test_session_header_too_large() {
    let cfg = ServerConfig {
        recv_chunk_size: 8,
        max_header_bytes: 32,
        ..Default::default()
    };
    let stream = ScriptedStream::new()
        .data(b"GET / HTTP/1.1\r\n")
        .data(b"X-Long: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n")
        .data(b"\r\n");
    let mut session = Session::new(stream, &cfg);

    let result = session.read_request().await;
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ParseError::HeaderTooLarge { max_size: 32, .. }))
    ));
}

#[tokio::test]
async fn test_session_no_reentry_after_header_parsed() {
    let stream = ScriptedStream::new().data(b"GET / HTTP/1.1\r\n\r\n");
    let mut session = Session::new(stream, &ServerConfig::default());

    session.read_request().await.unwrap();
    let again = session.read_request().await;

    assert!(matches!(again, Err(SessionError::AlreadyParsed)));
}
