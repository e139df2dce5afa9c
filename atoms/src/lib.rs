//! Per-entity building blocks: models, repository adapters and thin HTTP handlers.
//! Cross-entity rules (favorite sync, cascades) live in the blocks.

pub mod catalogs;
pub mod error;
pub mod events;
pub mod featured;
pub mod media;

pub use error::{AtomError, AtomResult};
