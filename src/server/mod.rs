//! Connection supervision: the accept loop and per-connection tasks.

pub mod listener;
