//! sv-core: shared types, IDs, errors, configuration, and the audit event bus.
//!
//! This crate is the foundational dependency for all other sv-* crates,
//! providing type-safe identifiers, a unified error type, the role and media
//! kind enums, application configuration, and a broadcast event bus for
//! security audit events.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
