//! Marketplace roles and the authenticated actor.

use serde::{Deserialize, Serialize};

use buildmart_core::ActorId;

/// The three independently-acting marketplace roles.
///
/// Every order transition is gated on exactly one of these; the role check
/// runs before any state check so an unauthorized actor never learns an
/// order's current status from error content.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Vendor,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::Vendor => "vendor",
            ActorRole::Admin => "admin",
        }
    }
}

impl core::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor: identity plus role.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: ActorId, role: ActorRole) -> Self {
        Self { id, role }
    }
}
