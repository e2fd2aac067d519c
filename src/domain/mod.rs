//! Domain layer types and invariants.

pub mod activity;
pub mod entities;
pub mod error;
pub mod types;
