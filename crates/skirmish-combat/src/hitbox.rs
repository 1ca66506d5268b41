//! Weapon hazard lifecycle and hit reporting.
//!
//! A hitbox strikes each qualifying body at most once per activation:
//! - [`Hitbox::activate`] clears the registry and hands back a scan request
//!   that the world runs one tick later, once the hazard's bounds are valid
//! - [`Hitbox::scan`] strikes bodies that were already overlapping
//! - [`Hitbox::on_overlap_begin`] strikes bodies entering while active
//!
//! The hitbox never touches actor internals. It produces [`HitReport`]s and the
//! world delivers each one through a single `take_damage` call.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ColliderId, EntityId, Faction};
use tracing::debug;

use crate::config::HitboxProfile;
use crate::hit_registry::HitRegistry;
use crate::physics::{Aabb, ColliderBinding};
use crate::schedule::DeferredAction;

/// A qualifying strike produced by a hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitReport {
    /// Actor wielding the hitbox.
    pub attacker: EntityId,
    /// Actor struck.
    pub target: EntityId,
    /// Damage to apply.
    pub damage: i32,
}

/// A damage-emitting region attached to an attacking actor.
#[derive(Debug, Clone)]
pub struct Hitbox {
    owner: EntityId,
    faction: Faction,
    damage: i32,
    offset: Vec2,
    half_extents: Vec2,
    collider: Option<ColliderId>,
    active: bool,
    activation: u64,
    registry: HitRegistry,
}

impl Hitbox {
    /// Create an inactive hitbox for `owner`.
    #[must_use]
    pub fn new(owner: EntityId, faction: Faction, profile: &HitboxProfile) -> Self {
        Self {
            owner,
            faction,
            damage: profile.damage.max(0),
            offset: profile.offset,
            half_extents: profile.half_extents,
            collider: None,
            active: false,
            activation: 0,
            registry: HitRegistry::new(),
        }
    }

    /// Attach the physics collider backing this hazard.
    #[must_use]
    pub fn with_collider(mut self, collider: Option<ColliderId>) -> Self {
        self.collider = collider;
        self
    }

    /// Actor wielding the hitbox.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Damage per strike.
    #[must_use]
    pub fn damage(&self) -> i32 {
        self.damage
    }

    /// Local offset from the owner.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Physics collider, if the hazard has an overlap shape.
    #[must_use]
    pub fn collider(&self) -> Option<ColliderId> {
        self.collider
    }

    /// Check if the hazard is live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Counter bumped on every inactive-to-active transition.
    #[must_use]
    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// Targets struck during the current activation.
    #[must_use]
    pub fn registry(&self) -> &HitRegistry {
        &self.registry
    }

    /// World-space bounds given the owner's position.
    #[must_use]
    pub fn bounds(&self, owner_position: Vec2) -> Aabb {
        Aabb::new(owner_position + self.offset, self.half_extents)
    }

    /// Switch the hazard on.
    ///
    /// Clears the registry and returns the deferred scan to schedule. Calling
    /// this on an already active hitbox does nothing and returns `None`.
    pub fn activate(&mut self) -> Option<DeferredAction> {
        if self.active {
            return None;
        }

        self.active = true;
        self.activation += 1;
        self.registry.clear();
        debug!(owner = ?self.owner, activation = self.activation, "Hitbox activated");

        Some(DeferredAction::ScanHitbox {
            owner: self.owner,
            activation: self.activation,
        })
    }

    /// Switch the hazard off. Pending scans for this activation become no-ops.
    pub fn deactivate(&mut self) {
        if self.active {
            debug!(owner = ?self.owner, struck = self.registry.len(), "Hitbox deactivated");
        }
        self.active = false;
    }

    /// Negate the horizontal offset so the hazard follows the owner's facing.
    pub fn mirror(&mut self) {
        self.offset.x = -self.offset.x;
    }

    /// Check if a collider is a valid target for this hitbox.
    #[must_use]
    pub fn qualifies(&self, binding: &ColliderBinding) -> bool {
        binding.owner != self.owner && binding.is_body_of(self.faction.opponent())
    }

    /// Run the activation-time scan over everything currently overlapping.
    ///
    /// Returns nothing if the hitbox was deactivated or reactivated since the
    /// scan was scheduled.
    pub fn scan<I>(&mut self, activation: u64, overlapping: I) -> Vec<HitReport>
    where
        I: IntoIterator<Item = ColliderBinding>,
    {
        if !self.active || activation != self.activation {
            debug!(owner = ?self.owner, activation, "Stale hitbox scan skipped");
            return Vec::new();
        }

        overlapping
            .into_iter()
            .filter_map(|binding| self.strike(&binding))
            .collect()
    }

    /// Handle a collider entering the hazard.
    pub fn on_overlap_begin(&mut self, other: &ColliderBinding) -> Option<HitReport> {
        if !self.active {
            return None;
        }
        self.strike(other)
    }

    fn strike(&mut self, binding: &ColliderBinding) -> Option<HitReport> {
        if !self.qualifies(binding) || !self.registry.register(binding.owner) {
            return None;
        }

        Some(HitReport {
            attacker: self.owner,
            target: binding.owner,
            damage: self.damage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ColliderRole;

    fn player_hitbox() -> Hitbox {
        Hitbox::new(
            EntityId::from_raw(1),
            Faction::Player,
            &HitboxProfile::default(),
        )
    }

    fn enemy_body(raw: u64) -> ColliderBinding {
        ColliderBinding {
            owner: EntityId::from_raw(raw),
            faction: Faction::Enemy,
            role: ColliderRole::Body,
        }
    }

    #[test]
    fn test_activation_schedules_scan() {
        let mut hitbox = player_hitbox();
        let action = hitbox.activate();
        assert_eq!(
            action,
            Some(DeferredAction::ScanHitbox {
                owner: EntityId::from_raw(1),
                activation: 1,
            })
        );
        assert!(hitbox.is_active());

        // Already active
        assert_eq!(hitbox.activate(), None);
        assert_eq!(hitbox.activation(), 1);
    }

    #[test]
    fn test_scan_strikes_each_target_once() {
        let mut hitbox = player_hitbox();
        hitbox.activate();

        let hits = hitbox.scan(1, [enemy_body(2), enemy_body(3), enemy_body(2)]);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.damage == 20));

        assert_eq!(hitbox.on_overlap_begin(&enemy_body(3)), None);
        assert!(hitbox.on_overlap_begin(&enemy_body(4)).is_some());
    }

    #[test]
    fn test_faction_filter() {
        let mut hitbox = player_hitbox();
        hitbox.activate();

        let ally = ColliderBinding {
            owner: EntityId::from_raw(9),
            faction: Faction::Player,
            role: ColliderRole::Body,
        };
        let enemy_weapon = ColliderBinding {
            owner: EntityId::from_raw(5),
            faction: Faction::Enemy,
            role: ColliderRole::Hitbox,
        };
        assert_eq!(hitbox.on_overlap_begin(&ally), None);
        assert_eq!(hitbox.on_overlap_begin(&enemy_weapon), None);
    }

    #[test]
    fn test_stale_scan_is_noop() {
        let mut hitbox = player_hitbox();
        hitbox.activate();
        hitbox.deactivate();
        assert!(hitbox.scan(1, [enemy_body(2)]).is_empty());

        hitbox.activate();
        // Scan from the first activation
        assert!(hitbox.scan(1, [enemy_body(2)]).is_empty());
        assert_eq!(hitbox.scan(2, [enemy_body(2)]).len(), 1);
    }

    #[test]
    fn test_inactive_ignores_overlap() {
        let mut hitbox = player_hitbox();
        assert_eq!(hitbox.on_overlap_begin(&enemy_body(2)), None);
    }

    #[test]
    fn test_reactivation_resets_registry() {
        let mut hitbox = player_hitbox();
        hitbox.activate();
        assert!(hitbox.on_overlap_begin(&enemy_body(2)).is_some());

        hitbox.deactivate();
        hitbox.activate();
        assert!(hitbox.registry().is_empty());
        assert!(hitbox.on_overlap_begin(&enemy_body(2)).is_some());
    }

    #[test]
    fn test_mirror_negates_offset() {
        let mut hitbox = player_hitbox();
        let before = hitbox.offset();
        hitbox.mirror();
        assert_eq!(hitbox.offset(), Vec2::new(-before.x, before.y));

        let bounds = hitbox.bounds(Vec2::new(2.0, 1.0));
        assert_eq!(bounds.center, Vec2::new(2.0 - before.x, 1.0 + before.y));
    }
}
