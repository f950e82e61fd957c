use thiserror::Error;
use tracing::debug;

use crate::buffer::{ByteBuffer, View};
use crate::http::framer::{Framer, Framing};
use crate::http::mime::Mime;
use crate::http::request::{Method, Request};

/// The only protocol token accepted on the request line.
pub const HTTP_1_1: &[u8] = b"HTTP/1.1";

pub const CRLF: &[u8] = b"\r\n";

const FIELD_SEPARATOR: &[u8] = b": ";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("header terminator not received yet")]
    Incomplete,

    #[error("malformed request line")]
    InvalidRequestLine,

    #[error("unsupported http method")]
    InvalidMethod,

    #[error("unsupported protocol version, expected HTTP/1.1")]
    InvalidVersion,

    #[error("malformed header field line")]
    InvalidHeader,

    #[error("invalid content-length value")]
    InvalidContentLength,

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("declared body of {declared} bytes exceeds the limit {max_size}")]
    BodyTooLarge { declared: u64, max_size: u64 },
}

/// Everything the header block says about a request, as views into the
/// buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    pub path: View,
    pub protocol: View,
    pub content_type: Option<Mime>,
    pub content_length: Option<u64>,
    pub headers: Vec<(View, View)>,
}

/// Frames and parses a fully received request header.
///
/// Returns [`ParseError::Incomplete`] if `raw` does not contain the header
/// terminator yet.
pub fn parse_request(raw: ByteBuffer) -> Result<Request, ParseError> {
    let Framing::Complete { header, body } = Framer::new().frame(&raw) else {
        return Err(ParseError::Incomplete);
    };

    let head = parse_head(&raw, header)?;
    Ok(Request::from_head(raw, head, body))
}

/// Parses the framed header region: request line, then field lines.
///
/// Pure with respect to `buf`; parsing the same region twice yields the same
/// head.
pub fn parse_head(buf: &ByteBuffer, header: View) -> Result<RequestHead, ParseError> {
    let (request_line, fields) = split_line(buf, header);

    let (method, path, protocol) = parse_request_line(buf, request_line)?;
    let headers = parse_fields(buf, fields)?;

    let mut content_type = None;
    let mut content_length = None;

    // Later occurrences overwrite earlier ones.
    for &(key, value) in &headers {
        let key_bytes = buf.get(key);

        if key_bytes.eq_ignore_ascii_case(b"Content-Type") {
            let mime = Mime::classify(buf.get(value));
            if mime == Mime::Unrecognized {
                debug!(
                    content_type = %String::from_utf8_lossy(buf.get(value)),
                    "Unrecognized content type"
                );
            }
            content_type = Some(mime);
        } else if key_bytes.eq_ignore_ascii_case(b"Content-Length") {
            content_length = Some(parse_content_length(buf.get(value))?);
        }
    }

    Ok(RequestHead {
        method,
        path,
        protocol,
        content_type,
        content_length,
        headers,
    })
}

/// Splits `<METHOD> <PATH> <PROTOCOL>`.
pub fn parse_request_line(
    buf: &ByteBuffer,
    line: View,
) -> Result<(Method, View, View), ParseError> {
    let (method, rest) = buf.split(line, b" ").ok_or(ParseError::InvalidRequestLine)?;
    let (path, protocol) = buf.split(rest, b" ").ok_or(ParseError::InvalidRequestLine)?;

    let method = Method::from_bytes(buf.get(method)).ok_or(ParseError::InvalidMethod)?;

    if path.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    if buf.get(protocol) != HTTP_1_1 {
        return Err(ParseError::InvalidVersion);
    }

    Ok((method, path, protocol))
}

/// Tokenizes `<Key>: <Value>` lines into key/value views, in order.
///
/// A line holding only whitespace ends the field section; anything after it
/// is ignored.
pub fn parse_fields(buf: &ByteBuffer, mut rest: View) -> Result<Vec<(View, View)>, ParseError> {
    let mut fields = Vec::new();

    while !rest.is_empty() {
        let (line, next) = split_line(buf, rest);
        rest = next;

        if line.is_empty() {
            continue;
        }

        if buf.get(line).iter().all(u8::is_ascii_whitespace) {
            debug!(ignored = rest.len(), "Whitespace-only header line ends field section");
            break;
        }

        let (key, value) = buf
            .split(line, FIELD_SEPARATOR)
            .ok_or(ParseError::InvalidHeader)?;

        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        fields.push((key, value));
    }

    Ok(fields)
}

/// Chops the first CRLF-terminated line off `view`. Without a CRLF the whole
/// view is the line.
pub fn split_line(buf: &ByteBuffer, view: View) -> (View, View) {
    buf.split(view, CRLF)
        .unwrap_or_else(|| view.split_at(view.len()))
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::InvalidContentLength);
    }

    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(ParseError::InvalidContentLength)
}
