//! Request routing.
//!
//! # Data Flow
//! ```text
//! Request (method, path)
//!     → router.rs   (static table, first match wins)
//!     → Route       (handler + path remainder)
//!     → handlers.rs (may touch the blob store)
//!     → Response
//! ```
//!
//! The route table is a constant. GET and POST partition the table first,
//! so overlapping prefixes never compete across methods.

pub mod handlers;
pub mod router;

pub use router::{Route, Router, route};
