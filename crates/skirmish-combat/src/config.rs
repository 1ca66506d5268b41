//! Combat tuning.
//!
//! Every value can be overridden from a config file; missing fields fall back
//! to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Shape and damage of an actor's weapon hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxProfile {
    /// Damage applied per strike.
    pub damage: i32,
    /// Offset from the owner's position while facing right.
    pub offset: Vec2,
    /// Half extents of the hazard box. A zero extent means no overlap shape.
    pub half_extents: Vec2,
}

impl Default for HitboxProfile {
    fn default() -> Self {
        Self {
            damage: 20,
            offset: Vec2::new(0.8, 0.0),
            half_extents: Vec2::new(0.5, 0.4),
        }
    }
}

impl HitboxProfile {
    /// Check if the hazard has a usable overlap shape.
    #[must_use]
    pub fn has_shape(&self) -> bool {
        self.half_extents.x > 0.0 && self.half_extents.y > 0.0
    }
}

/// Per-kind actor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorProfile {
    /// Starting and maximum health.
    pub max_health: i32,
    /// Length of the stagger or invincibility window after a non-lethal hit.
    pub disable_duration: f32,
    /// Seconds between death and removal from the simulation.
    pub death_grace: f32,
    /// Minimum seconds between attack wind-ups.
    pub attack_cooldown: f32,
    /// Walking speed.
    pub move_speed: f32,
    /// Sprinting speed.
    pub sprint_speed: f32,
    /// Half extents of the body (hurtbox) collider.
    pub body_half_extents: Vec2,
    /// Weapon hazard, if the actor carries one.
    pub hitbox: Option<HitboxProfile>,
}

impl ActorProfile {
    /// Default tuning for the controllable actor.
    #[must_use]
    pub fn player() -> Self {
        Self {
            max_health: 100,
            disable_duration: 1.0,
            death_grace: 1.0,
            attack_cooldown: 0.5,
            move_speed: 5.0,
            sprint_speed: 8.0,
            body_half_extents: Vec2::new(0.4, 0.5),
            hitbox: Some(HitboxProfile::default()),
        }
    }

    /// Default tuning for hostile actors.
    #[must_use]
    pub fn hostile() -> Self {
        Self {
            max_health: 50,
            disable_duration: 1.0,
            death_grace: 1.0,
            attack_cooldown: 1.5,
            move_speed: 2.0,
            sprint_speed: 2.0,
            body_half_extents: Vec2::new(0.45, 0.35),
            hitbox: Some(HitboxProfile {
                damage: 10,
                offset: Vec2::new(0.7, 0.0),
                half_extents: Vec2::new(0.4, 0.3),
            }),
        }
    }

    /// Set maximum health.
    #[must_use]
    pub fn with_max_health(mut self, max_health: i32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Set the stagger/invincibility window.
    #[must_use]
    pub fn with_disable_duration(mut self, seconds: f32) -> Self {
        self.disable_duration = seconds;
        self
    }

    /// Set the weapon hazard.
    #[must_use]
    pub fn with_hitbox(mut self, hitbox: Option<HitboxProfile>) -> Self {
        self.hitbox = hitbox;
        self
    }

    /// Clamp values into sane ranges.
    pub fn validate(&mut self) {
        self.max_health = self.max_health.max(1);
        self.disable_duration = self.disable_duration.max(0.0);
        self.death_grace = self.death_grace.max(0.0);
        self.attack_cooldown = self.attack_cooldown.max(0.0);
        self.move_speed = self.move_speed.max(0.0);
        self.sprint_speed = self.sprint_speed.max(self.move_speed);
        self.body_half_extents = self.body_half_extents.max(Vec2::ZERO);
        if let Some(hitbox) = self.hitbox.as_mut() {
            hitbox.damage = hitbox.damage.max(0);
            hitbox.half_extents = hitbox.half_extents.max(Vec2::ZERO);
        }
    }
}

impl Default for ActorProfile {
    fn default() -> Self {
        Self::hostile()
    }
}

/// Combat configuration shared by every actor in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Tuning for the controllable actor.
    pub player: ActorProfile,
    /// Tuning for hostile actors.
    pub hostile: ActorProfile,
    /// Damage applied per tick of continuous contact with a hostile body.
    pub contact_damage: i32,
    /// Angular frequency of the blink effect while disabled.
    pub blink_frequency: f32,
    /// Capacity of the presentation event channel.
    pub event_capacity: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player: ActorProfile::player(),
            hostile: ActorProfile::hostile(),
            contact_damage: 10,
            blink_frequency: 10.0,
            event_capacity: 1024,
        }
    }
}

impl CombatConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp values into sane ranges.
    pub fn validate(&mut self) {
        self.player.validate();
        self.hostile.validate();
        self.contact_damage = self.contact_damage.max(0);
        self.blink_frequency = self.blink_frequency.max(0.0);
        self.event_capacity = self.event_capacity.max(16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuning() {
        let config = CombatConfig::default();
        assert_eq!(config.player.max_health, 100);
        assert_eq!(config.hostile.max_health, 50);
        assert_eq!(config.contact_damage, 10);
        assert_eq!(config.player.hitbox.as_ref().map(|h| h.damage), Some(20));
        assert_eq!(config.hostile.hitbox.as_ref().map(|h| h.damage), Some(10));
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = CombatConfig::default();
        config.player.max_health = -5;
        config.player.disable_duration = -1.0;
        config.hostile.hitbox = Some(HitboxProfile {
            damage: -3,
            ..HitboxProfile::default()
        });
        config.contact_damage = -10;
        config.event_capacity = 0;

        config.validate();

        assert_eq!(config.player.max_health, 1);
        assert_eq!(config.player.disable_duration, 0.0);
        assert_eq!(config.hostile.hitbox.as_ref().map(|h| h.damage), Some(0));
        assert_eq!(config.contact_damage, 0);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_hitbox_shape() {
        assert!(HitboxProfile::default().has_shape());
        let flat = HitboxProfile {
            half_extents: Vec2::new(0.5, 0.0),
            ..HitboxProfile::default()
        };
        assert!(!flat.has_shape());
    }
}
