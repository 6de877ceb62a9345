use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ConnectionError;
use crate::http::parser::{ParseError, ParserLimits, PendingRequest, RequestParser};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::routing::{Route, Router};
use crate::store::BlobStore;

const READ_CHUNK: usize = 4096;

/// Limits applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub limits: ParserLimits,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            limits: ParserLimits::default(),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for ConnectionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            limits: ParserLimits {
                max_head_bytes: cfg.max_head_bytes,
                max_body_bytes: cfg.max_body_bytes,
            },
            read_timeout: cfg.read_timeout,
            write_timeout: cfg.write_timeout,
        }
    }
}

/// One accepted connection, serving exactly one request.
pub struct Connection<T, S> {
    stream: T,
    buffer: BytesMut,
    parser: RequestParser,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

/// Where a connection is in its single request/response cycle.
///
/// `ReadingBody` holds the already parsed head, so the remaining body reads
/// only check the buffer length.
#[derive(Debug)]
pub enum ConnectionState {
    Accepted,
    Reading,
    Parsing,
    ReadingBody(PendingRequest),
    Routing(Request),
    Handling(Request, Route),
    Responding(ResponseWriter),
    Closed,
}

impl<T, S> Connection<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: BlobStore,
{
    pub fn new(stream: T, router: Arc<Router<S>>, settings: ConnectionSettings) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            parser: RequestParser::new(settings.limits),
            router,
            settings,
            state: ConnectionState::Accepted,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// Any error leaves the state at `Closed`. A malformed request is
    /// answered with 400 (or 413 for an oversized body) and then reported
    /// as `Malformed`.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        let mut rejected = None;

        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Accepted => ConnectionState::Reading,

                ConnectionState::Reading => {
                    if self.fill_buffer().await? == 0 {
                        if self.buffer.is_empty() {
                            debug!("Peer closed before sending a request");
                            ConnectionState::Closed
                        } else {
                            return Err(ConnectionError::Read(std::io::Error::new(
                                std::io::ErrorKind::UnexpectedEof,
                                "connection closed mid-request",
                            )));
                        }
                    } else {
                        ConnectionState::Parsing
                    }
                }

                ConnectionState::Parsing => match self.parser.parse_head(&self.buffer) {
                    Ok(pending) => self.complete(pending),
                    Err(ParseError::Incomplete) => ConnectionState::Reading,
                    Err(e) => {
                        warn!(error = %e, "Rejecting malformed request");
                        let response = error_response(&e);
                        rejected = Some(e);
                        ConnectionState::Responding(ResponseWriter::new(&response))
                    }
                },

                ConnectionState::ReadingBody(pending) => {
                    if self.fill_buffer().await? == 0 {
                        return Err(ConnectionError::Read(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "connection closed mid-body",
                        )));
                    }
                    self.complete(pending)
                }

                ConnectionState::Routing(request) => {
                    let route = self.router.route(&request);
                    ConnectionState::Handling(request, route)
                }

                ConnectionState::Handling(request, route) => {
                    let response = self.router.handle(&route, &request).await;
                    info!(
                        method = %request.method,
                        path = %request.path,
                        status = response.status.as_u16(),
                        "Handled request"
                    );
                    ConnectionState::Responding(ResponseWriter::new(&response))
                }

                ConnectionState::Responding(mut writer) => {
                    let write_timeout = self.settings.write_timeout;
                    timeout(write_timeout, writer.write_to_stream(&mut self.stream))
                        .await
                        .map_err(|_| ConnectionError::Timeout {
                            phase: "write",
                            after: write_timeout,
                        })?
                        .map_err(ConnectionError::Write)?;

                    if let Err(e) = self.stream.shutdown().await {
                        debug!(error = %e, "Shutdown after response failed");
                    }
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        match rejected {
            Some(e) => Err(ConnectionError::Malformed(e)),
            None => Ok(()),
        }
    }

    /// Moves to `Routing` once the buffer holds the whole body, otherwise
    /// keeps waiting for more of it.
    fn complete(&mut self, pending: PendingRequest) -> ConnectionState {
        match pending.finish(&self.buffer) {
            Ok((request, consumed)) => {
                self.buffer.advance(consumed);
                if !self.buffer.is_empty() {
                    debug!(
                        trailing = self.buffer.len(),
                        "Ignoring bytes after the first request"
                    );
                }
                ConnectionState::Routing(request)
            }
            Err(pending) => {
                self.buffer.reserve(pending.needed().saturating_sub(self.buffer.len()));
                ConnectionState::ReadingBody(pending)
            }
        }
    }

    /// Reads whatever the peer has sent next. Returns 0 at EOF.
    async fn fill_buffer(&mut self) -> Result<usize, ConnectionError> {
        self.buffer.reserve(READ_CHUNK);

        let read_timeout = self.settings.read_timeout;
        timeout(read_timeout, self.stream.read_buf(&mut self.buffer))
            .await
            .map_err(|_| ConnectionError::Timeout {
                phase: "read",
                after: read_timeout,
            })?
            .map_err(ConnectionError::Read)
    }
}

fn error_response(e: &ParseError) -> Response {
    match e {
        ParseError::BodyTooLarge { .. } => Response::empty(StatusCode::PayloadTooLarge),
        _ => Response::bad_request(),
    }
}
