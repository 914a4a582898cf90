//! tally core: the counter data model, response shaping, and the shared error
//! surface.
//!
//! This crate carries no transport, runtime, or storage dependencies so the
//! gateway, store backends, and tests can share one vocabulary.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `TallyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod error;

/// Shared result type.
pub use error::{Result, TallyError};
