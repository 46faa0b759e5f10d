//! Product and stock lot models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized unit of measure for stored quantities
///
/// Every product quantity is kept in one of three base units; the import
/// pipeline converts incoming measurements (kg, ml, ...) before persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "L")]
    Liters,
    #[serde(rename = "uni")]
    Units,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Liters => "L",
            Unit::Units => "uni",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "g" => Some(Unit::Grams),
            "L" => Some(Unit::Liters),
            "uni" => Some(Unit::Units),
            _ => None,
        }
    }
}

/// One physical stock lot of a raw material
///
/// Several rows may share a `code` (one per lot). A row without a lot code
/// and expiry, holding quantity zero, is a master placeholder created by
/// recipe import so a component can reference the product before any stock
/// has arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: Unit,
    pub quantity_available: Decimal,
    pub expires_at: Option<NaiveDate>,
    pub lot_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether this lot expires on or before `today + window_days`
    ///
    /// Lots with no expiry date never count as near expiry.
    pub fn is_near_expiry(&self, today: NaiveDate, window_days: i64) -> bool {
        match self.expires_at {
            Some(expires) => expires <= today + chrono::Duration::days(window_days),
            None => false,
        }
    }
}
