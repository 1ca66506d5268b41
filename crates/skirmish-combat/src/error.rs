//! Combat error types.

use skirmish_common::{ColliderId, EntityId};
use thiserror::Error;

/// Combat system error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// Actor not found (never spawned or already removed)
    #[error("unknown actor: {0:?}")]
    UnknownActor(EntityId),
    /// Collider not bound to any actor
    #[error("unknown collider: {0:?}")]
    UnknownCollider(ColliderId),
    /// Actor carries no weapon hazard
    #[error("actor {0:?} has no hitbox")]
    NoHitbox(EntityId),
    /// Actor is dead and cannot act
    #[error("actor {0:?} is dead")]
    ActorDead(EntityId),
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
