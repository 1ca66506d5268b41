//! Presentation events published by the combat core.
//!
//! The core never draws anything. Rendering, audio, and UI layers drain these
//! events and react.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use skirmish_common::EntityId;
use tracing::warn;

use crate::actor::{DisableKind, Facing, Pose};

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A hitbox struck a target
    HitLanded {
        /// Actor wielding the hitbox
        attacker: EntityId,
        /// Actor struck
        target: EntityId,
    },
    /// An actor lost health
    Damaged {
        /// Actor damaged
        target: EntityId,
        /// Health removed
        amount: i32,
        /// Health left
        health: i32,
        /// Attacker or contact source, if known
        source: Option<EntityId>,
    },
    /// A damage request was ignored
    DamageSuppressed {
        /// Actor that ignored the request
        target: EntityId,
    },
    /// A hostile actor entered stagger
    Staggered {
        /// Actor staggered
        entity: EntityId,
    },
    /// The player entered invincibility
    InvincibilityStarted {
        /// Actor made invincible
        entity: EntityId,
    },
    /// A disabled window ended; the actor is fully opaque again
    Recovered {
        /// Actor recovered
        entity: EntityId,
        /// Window that ended
        kind: DisableKind,
    },
    /// An actor died
    Died {
        /// Actor that died
        entity: EntityId,
    },
    /// An actor was removed from the simulation
    Removed {
        /// Actor removed
        entity: EntityId,
    },
    /// Opacity for the flashing-visibility effect
    BlinkIntensity {
        /// Actor blinking
        entity: EntityId,
        /// Opacity in [0, 1]
        alpha: f32,
    },
    /// The actor's pose changed
    PoseChanged {
        /// Actor
        entity: EntityId,
        /// New pose
        pose: Pose,
    },
    /// The actor turned around
    FacingChanged {
        /// Actor
        entity: EntityId,
        /// New facing
        facing: Facing,
    },
    /// An attack wind-up started
    AttackStarted {
        /// Actor attacking
        entity: EntityId,
    },
}

impl CombatEvent {
    /// Short name used for counting and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HitLanded { .. } => "hit_landed",
            Self::Damaged { .. } => "damaged",
            Self::DamageSuppressed { .. } => "damage_suppressed",
            Self::Staggered { .. } => "staggered",
            Self::InvincibilityStarted { .. } => "invincibility_started",
            Self::Recovered { .. } => "recovered",
            Self::Died { .. } => "died",
            Self::Removed { .. } => "removed",
            Self::BlinkIntensity { .. } => "blink_intensity",
            Self::PoseChanged { .. } => "pose_changed",
            Self::FacingChanged { .. } => "facing_changed",
            Self::AttackStarted { .. } => "attack_started",
        }
    }
}

/// Bounded channel carrying [`CombatEvent`]s to the presentation layer.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for publishing events
    sender: Sender<CombatEvent>,
    /// Receiver for draining events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    ///
    /// Never blocks. Returns `false` if the bus was full and the event dropped.
    pub fn publish(&self, event: CombatEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    "Event bus full ({} pending), dropped {}",
                    self.capacity,
                    event.name()
                );
                false
            },
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let entity = EntityId::from_raw(3);
        bus.publish(CombatEvent::Died { entity });
        bus.publish(CombatEvent::Removed { entity });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events[0].name(), "died");
        assert_eq!(events[1], CombatEvent::Removed { entity });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let entity = EntityId::from_raw(3);
        assert!(bus.publish(CombatEvent::Died { entity }));
        assert!(!bus.publish(CombatEvent::Removed { entity }));

        assert_eq!(bus.drain(), vec![CombatEvent::Died { entity }]);
        assert_eq!(bus.capacity(), 1);
    }
}
