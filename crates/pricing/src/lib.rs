//! `buildmart-pricing`: delivery pricing and geocoding.
//!
//! Two collaborating pieces: a [`GeocodingCache`] that memoizes pincode
//! lookups against an external provider (with an approximate per-region
//! fallback), and a [`DeliveryPricingEngine`] that resolves the nearest
//! serving warehouse and applies the tiered delivery charge.

pub mod engine;
pub mod geocode;
pub mod provider;
pub mod warehouse;

pub use engine::{DeliveryPricingEngine, DeliveryQuote, ItemPricing};
pub use geocode::{
    CacheStats, GeocodeError, GeocodeProvider, GeocodeResult, GeocodingCache, ResolvedLocation,
};
pub use provider::HttpGeocodeProvider;
pub use warehouse::{DeliveryConfig, Warehouse};
