//! Unit-of-measure normalization for imported stock quantities
//!
//! Supplier exports mix kilograms, grams, milliliters and free-form count
//! units. Everything is folded into the three base units of [`Unit`] so the
//! feasibility engine can compare quantities directly.

use rust_decimal::Decimal;

use crate::models::Unit;

/// Map a raw unit string from an import file to a normalized base unit
///
/// Returns `None` for units the system does not recognize; callers decide
/// whether to skip the row or fail.
pub fn normalize_unit(raw: &str) -> Option<Unit> {
    match raw.trim().to_lowercase().as_str() {
        "kg" | "kilo" | "kilogramo" | "kilogramos" => Some(Unit::Grams),
        "g" | "gr" | "gramo" | "gramos" => Some(Unit::Grams),
        "l" | "litro" | "litros" => Some(Unit::Liters),
        "ml" | "mililitro" | "mililitros" => Some(Unit::Liters),
        "uni" | "unidad" | "unidades" | "u" => Some(Unit::Units),
        _ => None,
    }
}

/// Convert a quantity expressed in `raw` units into its normalized base unit
///
/// Kilograms scale up to grams, milliliters scale down to liters; anything
/// already in a base unit passes through unchanged.
pub fn convert_quantity(quantity: Decimal, raw: &str) -> Decimal {
    match raw.trim().to_lowercase().as_str() {
        "kg" | "kilo" | "kilogramo" | "kilogramos" => quantity * Decimal::ONE_THOUSAND,
        "ml" | "mililitro" | "mililitros" => quantity / Decimal::ONE_THOUSAND,
        _ => quantity,
    }
}

/// Normalize a raw measurement into `(base unit, converted quantity)`
pub fn normalize_measurement(quantity: Decimal, raw: &str) -> Option<(Unit, Decimal)> {
    let unit = normalize_unit(raw)?;
    Some((unit, convert_quantity(quantity, raw)))
}
