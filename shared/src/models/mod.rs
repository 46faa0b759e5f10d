//! Domain models for the Batch Production Planner

mod feasibility;
mod product;
mod recipe;

pub use feasibility::*;
pub use product::*;
pub use recipe::*;
