//! Lantern - minimal HTTP/1.1 server
//!
//! Serves plain-text echo, User-Agent reflection, and single-file GET/POST
//! against a storage directory.

pub mod config;
pub mod error;
pub mod http;
pub mod routing;
pub mod server;
pub mod store;
