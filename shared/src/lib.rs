//! Shared types and models for the Batch Production Planner
//!
//! This crate contains the domain models and pure helpers shared between the
//! backend and any future frontend components of the system.

pub mod models;
pub mod units;
pub mod validation;

pub use models::*;
pub use units::*;
pub use validation::*;
