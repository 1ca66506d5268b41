//! # Skirmish Combat
//!
//! Melee combat core for Project Skirmish.
//!
//! This crate owns everything between "a weapon hazard switched on" and
//! "an actor was removed":
//! - Status timers with blink feedback
//! - Hit registries (one strike per target per activation)
//! - Weapon hitboxes with a one-tick deferred activation scan
//! - Damageable actors (stagger, invincibility, death)
//! - Continuous contact damage
//! - Facing and hazard mirroring
//! - A combat world driven at variable and fixed rates
//!
//! Physics, rendering, and input live elsewhere. The world talks to physics
//! through [`PhysicsWorld`] and to presentation through [`EventBus`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod config;
pub mod contact;
pub mod error;
pub mod events;
pub mod hit_registry;
pub mod hitbox;
pub mod physics;
pub mod schedule;
pub mod status_timer;
pub mod world;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::config::*;
    pub use crate::contact::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::hit_registry::*;
    pub use crate::hitbox::*;
    pub use crate::physics::*;
    pub use crate::schedule::*;
    pub use crate::status_timer::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_player_strikes_hostile() {
        let mut world = CombatWorld::new(ColliderWorld::new(), CombatConfig::default());
        let player = world.spawn_actor(ActorKind::Player, Vec2::ZERO);
        let hostile = world.spawn_actor(ActorKind::Hostile, Vec2::new(1.0, 0.0));

        assert_eq!(world.try_attack(player), Ok(true));
        assert!(world.activate_hitbox(player).is_ok());
        world.update(0.016);

        let target = world.actor(hostile).expect("hostile alive");
        assert_eq!(target.health(), 30);
        assert!(target.is_staggered());
    }
}
