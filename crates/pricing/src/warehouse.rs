//! Warehouse catalog entries.

use serde::{Deserialize, Serialize};

use buildmart_core::{GeoPoint, WarehouseId};

/// Per-warehouse delivery pricing configuration.
///
/// Monetary amounts are in the smallest currency unit (paise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Flat charge applied to every delivery from this warehouse.
    pub base_charge: u64,
    /// Charge per kilometre beyond the free radius.
    pub per_km_charge: u64,
    /// Distance within which no per-km charge applies.
    pub free_delivery_radius_km: f64,
    /// Order subtotal at or above which delivery is free.
    pub free_delivery_threshold: u64,
    /// Minimum order subtotal this warehouse will serve.
    pub minimum_order_value: u64,
}

/// A warehouse: location, the material categories it stocks, and its
/// delivery pricing. Multiple warehouses may serve the same category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: GeoPoint,
    pub served_categories: Vec<String>,
    pub delivery: DeliveryConfig,
}

impl Warehouse {
    pub fn serves(&self, category: &str) -> bool {
        self.served_categories.iter().any(|c| c == category)
    }
}
