//! HTTP handlers for the Batch Production Planner

pub mod health;
pub mod import;
pub mod product;
pub mod production;
pub mod recipe;

pub use health::*;
pub use import::*;
pub use product::*;
pub use production::*;
pub use recipe::*;
