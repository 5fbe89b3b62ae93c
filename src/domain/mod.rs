//! Domain layer types and invariants.

pub mod content;
pub mod entities;
pub mod types;
pub mod validate;
pub mod workflow;
