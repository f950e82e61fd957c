use cupido::buffer::ByteBuffer;
use cupido::http::mime::Mime;
use cupido::http::parser::parse_request;
use cupido::http::request::{Method, Request};

fn parse(raw: &[u8]) -> Request {
    parse_request(ByteBuffer::from(raw)).unwrap()
}

#[test]
fn test_request_header_retrieval() {
    let req = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\nContent-Type: application/json\r\n\r\n");

    assert_eq!(req.header("Host"), Some(&b"example.com"[..]));
    assert_eq!(req.header("host"), Some(&b"example.com"[..]));
    assert_eq!(req.header("Content-Type"), Some(&b"application/json"[..]));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_headers_keep_order() {
    let req = parse(b"GET / HTTP/1.1\r\nB: 2\r\nA: 1\r\nC: 3\r\n\r\n");
    let keys: Vec<&[u8]> = req.headers().map(|(k, _)| k).collect();

    assert_eq!(keys, vec![&b"B"[..], &b"A"[..], &b"C"[..]]);
}

#[test]
fn test_request_content_length_missing() {
    let req = parse(b"GET / HTTP/1.1\r\n\r\n");

    assert_eq!(req.content_length, None);
    assert_eq!(req.expected_body_len(), 0);
    assert!(req.body.is_empty());
}

#[test]
fn test_request_content_type_missing() {
    let req = parse(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n");
    assert_eq!(req.content_type, None);
}

#[test]
fn test_request_content_type_values() {
    let cases: &[(&str, Mime)] = &[
        ("application/json", Mime::ApplicationJson),
        ("application/pdf", Mime::ApplicationPdf),
        ("application/gzip", Mime::ApplicationGzip),
        ("application/x-tar", Mime::ApplicationTar),
        ("application/vnd.rar", Mime::ApplicationRar),
        ("text/plain; charset=utf-8", Mime::TextPlain),
        ("image/jpeg", Mime::ImageJpeg),
        ("image/gif", Mime::ImageGif),
        ("image/webp", Mime::ImageWebp),
        ("image/svg+xml", Mime::Unrecognized),
        ("application/", Mime::Unrecognized),
    ];

    for (value, expected) in cases {
        let raw = format!("POST / HTTP/1.1\r\nContent-Type: {}\r\n\r\n", value);
        let req = parse(raw.as_bytes());
        assert_eq!(req.content_type, Some(*expected), "{}", value);
    }
}

#[test]
fn test_request_method_equality() {
    assert_eq!(Method::GET, Method::GET);
    assert_ne!(Method::GET, Method::POST);
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("DELETE"), Some(Method::DELETE));
    assert_eq!(Method::from_str("PATCH"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_request_method_as_str() {
    for method in [Method::GET, Method::POST, Method::DELETE] {
        assert_eq!(Method::from_str(method.as_str()), Some(method));
    }
}

#[test]
fn test_request_binary_body_prefix() {
    let req = parse(b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03");
    assert_eq!(req.body_prefix(), b"\x00\x01\x02\x03");
}

#[test]
fn test_mime_round_trips_through_strings() {
    for ext in ["json", "bin", "pdf", "gz", "tar", "rar", "txt", "html", "jpg", "png", "gif", "webp"] {
        let mime = Mime::from_extension(ext).unwrap();
        let s = mime.as_str().unwrap();
        assert_eq!(Mime::classify(s.as_bytes()), mime, "{}", ext);
    }

    assert_eq!(Mime::from_extension("HTML"), Some(Mime::TextHtml));
    assert_eq!(Mime::from_extension("exe"), None);
    assert_eq!(Mime::Unrecognized.as_str(), None);
}
