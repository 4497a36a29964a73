//! Actor-related types.
//!
//! An actor is the back-office user on whose behalf a record is created or updated.
//! The wizard never decides who the actor is; it asks an injected [`IdentityProvider`]
//! when a record is finalized.

use crate::NonEmptyText;
use serde::{Deserialize, Serialize};

/// Represents the user performing an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The full name of the actor.
    pub name: NonEmptyText,

    /// The back-office role of the actor (e.g., "Branch Manager", "Agent").
    pub role: NonEmptyText,
}

impl Actor {
    pub fn new(name: NonEmptyText, role: NonEmptyText) -> Self {
        Self { name, role }
    }
}

/// Source of the current actor for audit stamps.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Actor;
}

/// An identity provider that always reports the same actor.
///
/// Suitable for the CLI and for servers whose authentication layer resolves the actor
/// before constructing the wizard.
#[derive(Clone, Debug)]
pub struct StaticIdentity(Actor);

impl StaticIdentity {
    pub fn new(actor: Actor) -> Self {
        Self(actor)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Actor {
        self.0.clone()
    }
}
