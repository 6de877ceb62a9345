//! Per-connection failures.
//!
//! None of these escape the task that owns the connection. Malformed
//! requests are answered before the connection closes; read, write and
//! timeout failures close it without a response.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::http::parser::ParseError;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: &'static str, after: Duration },
    #[error("malformed request: {0}")]
    Malformed(#[from] ParseError),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}
