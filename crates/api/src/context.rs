use buildmart_auth::{Actor, ActorRole};
use buildmart_core::ActorId;

/// Authenticated actor for a request.
///
/// Immutable; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor.id
    }

    pub fn role(&self) -> ActorRole {
        self.actor.role
    }
}
