use thiserror::Error;
use tracing::{trace, warn};

use crate::http::headers::Headers;
use crate::http::request::{Method, Request};

/// Largest request line plus headers accepted, in bytes.
pub const DEFAULT_MAX_HEAD_BYTES: usize = 8 * 1024;
/// Largest request body accepted, in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// More bytes are needed before a decision can be made.
    #[error("incomplete request")]
    Incomplete,
    #[error("request line is not `<method> <path> <version>`")]
    InvalidRequestLine,
    #[error("request path does not start with '/'")]
    InvalidPath,
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("Content-Length is not a number: {0:?}")]
    InvalidContentLength(String),
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("declared body of {declared} bytes exceeds limit of {limit}")]
    BodyTooLarge { declared: usize, limit: usize },
}

/// Size ceilings enforced while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Headers the server knows the meaning of. Everything else is kept in the
/// header map untouched.
const KNOWN_HEADERS: [&str; 4] = ["Host", "User-Agent", "Accept-Encoding", "Content-Length"];

fn is_known_header(name: &str) -> bool {
    KNOWN_HEADERS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name))
}

enum State {
    RequestLine,
    Headers,
    Body,
    Done,
}

/// A request whose head has been parsed while its body may still be
/// arriving.
///
/// Holding on to this between reads means the head is parsed, and its
/// anomalies logged, exactly once per request.
#[derive(Debug)]
pub struct PendingRequest {
    method: Method,
    path: String,
    version: String,
    headers: Headers,
    body_start: usize,
    content_length: usize,
}

impl PendingRequest {
    /// Bytes the buffer must hold, counted from its start, for the body to
    /// be complete.
    pub fn needed(&self) -> usize {
        self.body_start + self.content_length
    }

    /// Cuts the body out of `buf` and returns the request with the number of
    /// bytes consumed. Hands `self` back untouched while the body is short.
    pub fn finish(self, buf: &[u8]) -> Result<(Request, usize), Self> {
        let needed = self.needed();
        if buf.len() < needed {
            return Err(self);
        }

        let request = Request {
            method: self.method,
            path: self.path,
            version: self.version,
            headers: self.headers,
            body: buf[self.body_start..needed].to_vec(),
        };

        Ok((request, needed))
    }
}

/// Parses one request out of a byte buffer.
///
/// The head (request line and headers) ends at the first CRLFCRLF. The body
/// is exactly Content-Length bytes after it, so bodies may carry CRLF and
/// NUL bytes freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestParser {
    limits: ParserLimits,
}

impl RequestParser {
    pub fn new(limits: ParserLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ParserLimits {
        self.limits
    }

    /// Parses a complete request, returning it with the number of bytes
    /// consumed. `Incomplete` until the whole body is in `buf`.
    pub fn parse(&self, buf: &[u8]) -> Result<(Request, usize), ParseError> {
        self.parse_head(buf)?
            .finish(buf)
            .map_err(|_| ParseError::Incomplete)
    }

    /// Parses the request line and headers and validates Content-Length
    /// against the body limit. The body itself need not have arrived yet.
    pub fn parse_head(&self, buf: &[u8]) -> Result<PendingRequest, ParseError> {
        let headers_end = match find_headers_end(buf) {
            Some(end) if end <= self.limits.max_head_bytes => end,
            Some(_) => return Err(ParseError::HeadTooLarge(self.limits.max_head_bytes)),
            None if buf.len() > self.limits.max_head_bytes => {
                return Err(ParseError::HeadTooLarge(self.limits.max_head_bytes));
            }
            None => return Err(ParseError::Incomplete),
        };

        let head = std::str::from_utf8(&buf[..headers_end])
            .map_err(|_| ParseError::InvalidEncoding)?;

        let mut lines = head.split("\r\n");
        let mut state = State::RequestLine;
        let mut request_line = None;
        let mut headers = Headers::new();
        let mut content_length = 0;

        loop {
            state = match state {
                State::RequestLine => {
                    let line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
                    request_line = Some(parse_request_line(line)?);
                    State::Headers
                }

                State::Headers => match lines.next() {
                    Some(line) => {
                        let (name, value) = parse_header_line(line);
                        headers.insert(name, value);
                        State::Headers
                    }
                    None => State::Body,
                },

                State::Body => {
                    content_length = self.content_length(&headers)?;
                    State::Done
                }

                State::Done => break,
            };
        }

        let (method, path, version) = request_line.ok_or(ParseError::InvalidRequestLine)?;

        Ok(PendingRequest {
            method,
            path,
            version,
            headers,
            body_start: headers_end + HEAD_TERMINATOR.len(),
            content_length,
        })
    }

    fn content_length(&self, headers: &Headers) -> Result<usize, ParseError> {
        let Some(raw) = headers.get("Content-Length") else {
            return Ok(0);
        };

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidContentLength(raw.to_string()));
        }

        let declared = raw
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;

        if declared > self.limits.max_body_bytes {
            return Err(ParseError::BodyTooLarge {
                declared,
                limit: self.limits.max_body_bytes,
            });
        }

        Ok(declared)
    }
}

/// Parses a request with the default limits.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    RequestParser::default().parse(buf)
}

fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let mut parts = line.split(' ');

    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    if method.is_empty() || path.is_empty() || version.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    if !path.starts_with('/') {
        return Err(ParseError::InvalidPath);
    }

    Ok((Method::from(method), path.to_string(), version.to_string()))
}

/// Splits a header line at the first `": "`.
///
/// A line without the separator is kept whole as the name with an empty
/// value.
fn parse_header_line(line: &str) -> (&str, &str) {
    let (name, value) = match line.split_once(": ") {
        Some((name, value)) => (name.trim(), value.trim()),
        None => {
            warn!(line, "Header line has no \": \" separator, keeping it with an empty value");
            (line.trim(), "")
        }
    };

    if !is_known_header(name) {
        trace!(name, value, "Retaining unrecognized header");
    }

    (name, value)
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}
