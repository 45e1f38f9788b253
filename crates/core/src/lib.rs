//! `buildmart-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error taxonomy, and shared value objects
//! (pincode, geo coordinates).

pub mod error;
pub mod geo;
pub mod id;
pub mod pincode;

pub use error::{DomainError, DomainResult};
pub use geo::GeoPoint;
pub use id::{ActorId, CustomerId, InvoiceNumber, LeadId, VendorId, WarehouseId};
pub use pincode::Pincode;
