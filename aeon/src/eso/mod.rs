//! ESO Phase 2 models.

pub mod models;

pub use models::*;
