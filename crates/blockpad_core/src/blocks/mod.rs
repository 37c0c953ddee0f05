//! Pure transformations over block sequences.
//!
//! # Responsibility
//! - Migrate legacy block shapes into canonical ones (`normalizer`).
//! - Compute the document-wide character count (`counter`).
//!
//! # Invariants
//! - Every function here is pure and deterministic; inputs are never mutated.

pub mod counter;
pub mod normalizer;
