//! Route handlers. Each turns a matched route into exactly one response.

use tracing::{debug, warn};

use crate::http::request::Request;
use crate::http::response::Response;
use crate::store::{BlobStore, StoreError};

pub fn root() -> Response {
    Response::ok()
}

/// Echoes the path remainder as received. Percent-escapes are not decoded.
pub fn echo(text: &str) -> Response {
    Response::text(text)
}

/// Reflects the User-Agent header. A missing header yields an empty body.
pub fn user_agent(request: &Request) -> Response {
    Response::text(request.user_agent())
}

pub async fn file_get<S: BlobStore>(store: &S, name: &str) -> Response {
    match store.read(name).await {
        Ok(bytes) => Response::octet_stream(bytes),
        Err(StoreError::NotFound) => Response::not_found(),
        Err(StoreError::InvalidName(rejected)) => {
            warn!(name = %rejected, "Rejected file read outside the storage root");
            Response::not_found()
        }
        Err(e) => {
            warn!(name, error = %e, "File read failed");
            Response::internal_error()
        }
    }
}

/// Stores the body under `name`. Every store failure, including a rejected
/// name, becomes a 500.
pub async fn file_post<S: BlobStore>(store: &S, name: &str, body: &[u8]) -> Response {
    match store.write(name, body).await {
        Ok(()) => {
            debug!(name, len = body.len(), "Stored file");
            Response::created()
        }
        Err(e) => {
            warn!(name, error = %e, "File write failed");
            Response::internal_error()
        }
    }
}

pub fn not_found() -> Response {
    Response::not_found()
}
