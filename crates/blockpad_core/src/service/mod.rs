//! Session-level use-case services.
//!
//! # Responsibility
//! - Orchestrate normalizer, counter, gateway and editor port into the
//!   document session lifecycle.
//! - Keep FFI/CLI hosts decoupled from storage and editor details.

pub mod notice;
pub mod session;
