//! The order aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildmart_core::{
    CustomerId, DomainError, DomainResult, InvoiceNumber, LeadId, Pincode, VendorId, WarehouseId,
};

use crate::status::OrderStatus;

/// One line of an order. Unit price stays unset until admin confirmation;
/// loading charges are optional extras supplied at the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_ref: String,
    pub category: String,
    pub quantity: u32,
    /// Price per unit in the smallest currency unit; `None` until the admin
    /// confirms the order.
    pub unit_price: Option<u64>,
    pub loading_charges: u64,
}

/// Destination details locked in when the order is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub address: String,
    pub pincode: Pincode,
    pub expected_date: DateTime<Utc>,
}

/// The external accounting documents mirrored for an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quote,
    SalesOrder,
    Invoice,
    EwayBill,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "quote",
            DocumentKind::SalesOrder => "sales_order",
            DocumentKind::Invoice => "invoice",
            DocumentKind::EwayBill => "eway_bill",
        }
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External document correlation ids. Each is set at most once; presence
/// means "already synced, do not resync".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRefs {
    pub quote_id: Option<String>,
    pub sales_order_id: Option<String>,
    pub invoice_id: Option<String>,
    pub eway_bill_id: Option<String>,
}

impl ExternalRefs {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::Quote => self.quote_id.as_deref(),
            DocumentKind::SalesOrder => self.sales_order_id.as_deref(),
            DocumentKind::Invoice => self.invoice_id.as_deref(),
            DocumentKind::EwayBill => self.eway_bill_id.as_deref(),
        }
    }

    /// Set an id if absent. Returns false (and leaves the stored value) when
    /// one is already present.
    pub fn set_if_absent(&mut self, kind: DocumentKind, external_id: impl Into<String>) -> bool {
        let slot = match kind {
            DocumentKind::Quote => &mut self.quote_id,
            DocumentKind::SalesOrder => &mut self.sales_order_id,
            DocumentKind::Invoice => &mut self.invoice_id,
            DocumentKind::EwayBill => &mut self.eway_bill_id,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(external_id.into());
        true
    }
}

/// One priced line of the delivery-pricing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingLine {
    pub item_ref: String,
    pub warehouse_id: WarehouseId,
    pub distance_km: f64,
    pub delivery_charge: u64,
    pub estimated_days: u32,
}

/// Immutable pricing snapshot captured at placement time. Subsequent
/// warehouse or tariff changes never retroactively affect a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub lines: Vec<PricingLine>,
    pub total_delivery_charge: u64,
    /// True when the destination was geocoded via the coarse regional
    /// fallback, so the distances (and charges) are estimates.
    pub is_approximate: bool,
    pub captured_at: DateTime<Utc>,
}

/// Per-item pricing supplied by the admin at confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemPrice {
    pub item_ref: String,
    pub unit_price: u64,
    #[serde(default)]
    pub loading_charges: u64,
}

/// The central aggregate: one marketplace order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub lead_id: LeadId,
    /// Assigned exactly once, when the order is placed.
    pub invoice_number: Option<InvoiceNumber>,
    pub customer_id: CustomerId,
    pub vendor_id: VendorId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    /// Set at placement; amendable for 48 hours while pincode-equivalent.
    pub delivery: Option<DeliveryDetails>,
    pub placed_at: Option<DateTime<Utc>>,
    pub pricing: Option<PricingSnapshot>,
    pub external: ExternalRefs,
    /// Soft-delete flag; cancelled orders are never hard-deleted.
    pub is_active: bool,
    /// Optimistic-concurrency version, bumped on every mutation.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: CustomerId,
        vendor_id: VendorId,
        items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        let now = Utc::now();
        Ok(Self {
            lead_id: LeadId::generate(),
            invoice_number: None,
            customer_id,
            vendor_id,
            status: OrderStatus::Pending,
            items,
            delivery: None,
            placed_at: None,
            pricing: None,
            external: ExternalRefs::default(),
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Item subtotal from whatever unit prices are known so far. Saturates
    /// instead of wrapping, so absurd amounts can never overflow past the
    /// free-delivery threshold.
    pub fn subtotal(&self) -> u64 {
        self.items.iter().fold(0u64, |acc, i| {
            let line = i
                .unit_price
                .unwrap_or(0)
                .saturating_mul(i.quantity as u64)
                .saturating_add(i.loading_charges);
            acc.saturating_add(line)
        })
    }

    /// Apply per-item confirmation pricing. All items must be covered in one
    /// call or nothing is applied.
    pub fn apply_line_item_pricing(&mut self, pricing: &[LineItemPrice]) -> DomainResult<()> {
        for item in &self.items {
            if !pricing.iter().any(|p| p.item_ref == item.item_ref) {
                return Err(DomainError::validation(format!(
                    "missing unit price for item '{}'",
                    item.item_ref
                )));
            }
        }
        for p in pricing {
            if !self.items.iter().any(|i| i.item_ref == p.item_ref) {
                return Err(DomainError::validation(format!(
                    "pricing references unknown item '{}'",
                    p.item_ref
                )));
            }
        }

        for item in &mut self.items {
            // Covered for every item by the checks above.
            if let Some(p) = pricing.iter().find(|p| p.item_ref == item.item_ref) {
                item.unit_price = Some(p.unit_price);
                item.loading_charges = p.loading_charges;
            }
        }
        Ok(())
    }

    /// Bump version and updated-at; every mutation path calls this before
    /// the store's optimistic update.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
