use bytes::Bytes;

use crate::buffer::{ByteBuffer, View};
use crate::http::mime::Mime;
use crate::http::parser::RequestHead;

/// HTTP request methods.
///
/// Only the methods the server routes are recognized; anything else fails
/// parsing with [`ParseError::InvalidMethod`](crate::http::parser::ParseError).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// DELETE - Delete a resource
    DELETE,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive.
    ///
    /// ```
    /// # use cupido::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::from_bytes(s.as_bytes())
    }

    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        match token {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"DELETE" => Some(Method::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
        }
    }
}

/// Where a request is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    AwaitingHeader,
    HeaderParsed,
    /// The header was refused; the connection only has an error left to give.
    Rejected,
}

/// A parsed HTTP request.
///
/// The request owns the raw accumulation buffer its header was parsed from;
/// path, protocol and header fields are views into it. The buffer is never
/// appended to again, so those views stay valid for the life of the request.
#[derive(Debug)]
pub struct Request {
    raw: ByteBuffer,
    state: RequestState,
    /// The HTTP method
    pub method: Method,
    path: View,
    protocol: View,
    /// Classified `Content-Type`, `None` when the field is absent
    pub content_type: Option<Mime>,
    /// Declared `Content-Length`, `None` when the field is absent
    pub content_length: Option<u64>,
    headers: Vec<(View, View)>,
    body_prefix: View,
    /// Request body, filled in by the connection once it has been received
    pub body: Bytes,
}

impl Request {
    pub(crate) fn from_head(raw: ByteBuffer, head: RequestHead, body_prefix: View) -> Self {
        Self {
            raw,
            state: RequestState::HeaderParsed,
            method: head.method,
            path: head.path,
            protocol: head.protocol,
            content_type: head.content_type,
            content_length: head.content_length,
            headers: head.headers,
            body_prefix,
            body: Bytes::new(),
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The request target exactly as received.
    pub fn path(&self) -> &[u8] {
        self.raw.get(self.path)
    }

    /// The request target, if it is valid UTF-8.
    pub fn path_str(&self) -> Option<&str> {
        std::str::from_utf8(self.path()).ok()
    }

    /// Protocol token from the request line. Always `HTTP/1.1`.
    pub fn protocol(&self) -> &[u8] {
        self.raw.get(self.protocol)
    }

    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// When a key appears more than once the last occurrence wins.
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| self.raw.get(*k).eq_ignore_ascii_case(key.as_bytes()))
            .map(|(_, v)| self.raw.get(*v))
    }

    /// All header fields in the order they were received, duplicates included.
    pub fn headers(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.headers
            .iter()
            .map(|(k, v)| (self.raw.get(*k), self.raw.get(*v)))
    }

    /// Body bytes that arrived in the same reads as the header.
    pub fn body_prefix(&self) -> &[u8] {
        self.raw.get(self.body_prefix)
    }

    /// Declared body length, `0` when absent.
    pub fn expected_body_len(&self) -> u64 {
        self.content_length.unwrap_or(0)
    }
}
