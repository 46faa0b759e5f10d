//! Validation helpers for the Batch Production Planner

use rust_decimal::Decimal;

/// Validate the batch multiplier of a production request
pub fn validate_batch_count(batches: Decimal) -> Result<(), &'static str> {
    if batches <= Decimal::ZERO {
        return Err("Batch count must be positive");
    }
    Ok(())
}

/// Validate the per-batch quantity of a recipe component
pub fn validate_component_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Component quantity must be positive");
    }
    Ok(())
}
