//! Tiered delivery pricing over candidate warehouses.

use serde::{Deserialize, Serialize};

use buildmart_core::{GeoPoint, WarehouseId};

use crate::warehouse::Warehouse;

/// A resolved delivery quote for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub warehouse_id: WarehouseId,
    pub distance_km: f64,
    /// Delivery charge in the smallest currency unit.
    pub charge: u64,
    pub estimated_days: u32,
}

/// Pricing outcome for one item. "No eligible warehouse" is a normal,
/// typed negative result rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemPricing {
    Quoted(DeliveryQuote),
    Undeliverable { category: String },
}

impl ItemPricing {
    pub fn quote(&self) -> Option<&DeliveryQuote> {
        match self {
            ItemPricing::Quoted(q) => Some(q),
            ItemPricing::Undeliverable { .. } => None,
        }
    }
}

/// Resolves the serving warehouse for an item and applies the tiered
/// charge formula.
///
/// Warehouse selection: minimum great-circle distance to the destination,
/// tie-broken by lowest base charge and then by warehouse id so the result
/// is deterministic for equidistant candidates.
#[derive(Debug, Clone)]
pub struct DeliveryPricingEngine {
    warehouses: Vec<Warehouse>,
}

impl DeliveryPricingEngine {
    pub fn new(mut warehouses: Vec<Warehouse>) -> Self {
        // Stable id order makes the final tie-break independent of input order.
        warehouses.sort_by(|a, b| a.id.cmp(&b.id));
        Self { warehouses }
    }

    pub fn warehouses(&self) -> &[Warehouse] {
        &self.warehouses
    }

    /// Price delivery of one item category to `destination`.
    ///
    /// `order_subtotal` is the full order's item subtotal; at or above a
    /// warehouse's free-delivery threshold the charge is zero.
    pub fn price_item(
        &self,
        category: &str,
        destination: GeoPoint,
        order_subtotal: u64,
    ) -> ItemPricing {
        let selected = self
            .warehouses
            .iter()
            .filter(|w| w.serves(category) && order_subtotal >= w.delivery.minimum_order_value)
            .map(|w| (w, w.location.distance_km(&destination)))
            .min_by(|(wa, da), (wb, db)| {
                da.total_cmp(db)
                    .then_with(|| wa.delivery.base_charge.cmp(&wb.delivery.base_charge))
                    .then_with(|| wa.id.cmp(&wb.id))
            });

        let Some((warehouse, distance_km)) = selected else {
            return ItemPricing::Undeliverable {
                category: category.to_string(),
            };
        };

        let charge = tiered_charge(&warehouse.delivery, distance_km, order_subtotal);

        ItemPricing::Quoted(DeliveryQuote {
            warehouse_id: warehouse.id.clone(),
            distance_km,
            charge,
            estimated_days: estimated_days(distance_km),
        })
    }
}

/// `charge = base + per_km * max(0, distance - free_radius)`, zeroed when
/// the order subtotal reaches the free-delivery threshold.
fn tiered_charge(cfg: &crate::warehouse::DeliveryConfig, distance_km: f64, subtotal: u64) -> u64 {
    if subtotal >= cfg.free_delivery_threshold {
        return 0;
    }
    let billable_km = (distance_km - cfg.free_delivery_radius_km).max(0.0);
    cfg.base_charge + (cfg.per_km_charge as f64 * billable_km).round() as u64
}

fn estimated_days(distance_km: f64) -> u32 {
    // One day per started 150 km leg, capped at a week.
    (1 + (distance_km / 150.0).floor() as u32).min(7)
}
