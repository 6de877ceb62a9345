//! HTTP/1.1 subset: one request per connection, no keep-alive, no chunked
//! bodies.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine driving the pipeline
//! - **`parser`**: turns a byte buffer into a [`request::Request`], head first
//! - **`headers`**: case-insensitive header map
//! - **`request`**: request representation
//! - **`response`**: response representation with builder
//! - **`writer`**: serializes and writes responses
//!
//! # Connection State Machine
//!
//! ```text
//!   Accepted
//!      │
//!      ▼
//!   Reading ◄──────┐ Incomplete head
//!      │           │
//!      ▼           │
//!   Parsing ───────┘
//!      │ PendingRequest            │ Malformed (400 / 413)
//!      ▼                           │
//!   ReadingBody ◄──┐ short body    │
//!      │           │               │
//!      ├───────────┘               │
//!      │ Request                   │
//!      ▼                           │
//!   Routing                        │
//!      │ Route                     │
//!      ▼                           │
//!   Handling                       │
//!      │ Response                  │
//!      ▼                           │
//!   Responding ◄───────────────────┘
//!      │
//!      ▼
//!   Closed   (also reached directly on any read/write failure)
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
