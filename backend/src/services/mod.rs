//! Business logic services for the Batch Production Planner

pub mod catalog;
pub mod import;
pub mod product;
pub mod production;
pub mod recipe;

pub use catalog::{CatalogReader, PgCatalog};
pub use import::ImportService;
pub use product::ProductService;
pub use production::FeasibilityService;
pub use recipe::RecipeService;
