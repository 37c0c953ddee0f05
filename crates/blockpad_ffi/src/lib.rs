//! FFI layer for blockpad host integrations.

pub mod api;
