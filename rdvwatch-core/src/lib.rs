//! Core types and pipeline for the rdvwatch appointment watcher.

/// Domain models and identifiers shared by the pipeline and its frontends.
pub mod model;
/// Traits describing the appointment-backend interfaces.
pub mod ports;
/// Filter and ordering policy applied to a refreshed catalog.
pub mod select;
/// Discovery pipeline driving one polling pass.
pub mod service;

pub use model::*;
pub use ports::*;
pub use select::*;
pub use service::*;
