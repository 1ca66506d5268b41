//! Physics collaborator surface.
//!
//! The combat core never integrates bodies or resolves collisions itself. It
//! asks the physics layer for box overlaps, toggles and moves colliders, and
//! receives overlap begin/end notifications. [`ColliderWorld`] is a small
//! in-memory implementation used by the harness and tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ColliderId, EntityId, Faction};

/// Axis-aligned box described by center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the box.
    pub center: Vec2,
    /// Half width and half height.
    pub half_extents: Vec2,
}

impl Aabb {
    /// Creates a box from center and half extents.
    #[must_use]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Checks if this box overlaps another. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }
}

/// What a collider represents for combat purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderRole {
    /// The actor's own body; receives damage.
    Body,
    /// A weapon hazard; emits damage.
    Hitbox,
}

/// Capability attached to a collider at spawn time.
///
/// Resolving a struck collider to its actor goes through this binding rather
/// than through tag or component lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColliderBinding {
    /// Actor the collider belongs to.
    pub owner: EntityId,
    /// Faction of the owner.
    pub faction: Faction,
    /// Role of the collider.
    pub role: ColliderRole,
}

impl ColliderBinding {
    /// Checks if this collider is a body of the given faction.
    #[must_use]
    pub fn is_body_of(&self, faction: Faction) -> bool {
        self.role == ColliderRole::Body && self.faction == faction
    }
}

/// Overlap notification from the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent {
    /// `other` started overlapping `this`.
    Begin {
        /// Collider receiving the notification.
        this: ColliderId,
        /// Collider that entered.
        other: ColliderId,
    },
    /// `other` stopped overlapping `this`.
    End {
        /// Collider receiving the notification.
        this: ColliderId,
        /// Collider that left.
        other: ColliderId,
    },
}

/// Operations the combat core needs from the physics layer.
pub trait PhysicsWorld {
    /// Registers a box collider and returns its handle.
    fn add_collider(&mut self, center: Vec2, half_extents: Vec2) -> ColliderId;

    /// Removes a collider. Unknown handles are ignored.
    fn remove_collider(&mut self, collider: ColliderId);

    /// Returns enabled colliders intersecting the given region.
    fn overlap_box(&self, center: Vec2, half_extents: Vec2) -> Vec<ColliderId>;

    /// Enables or disables a collider.
    fn set_collider_enabled(&mut self, collider: ColliderId, enabled: bool);

    /// Moves a collider's center.
    fn set_collider_center(&mut self, collider: ColliderId, center: Vec2);
}

#[derive(Debug, Clone, Copy)]
struct ColliderEntry {
    bounds: Aabb,
    enabled: bool,
}

/// Brute-force in-memory physics world.
///
/// Tracks overlapping pairs between calls to [`ColliderWorld::collect_events`]
/// so it can emit begin/end notifications like a trigger system would.
#[derive(Debug, Default)]
pub struct ColliderWorld {
    colliders: BTreeMap<ColliderId, ColliderEntry>,
    touching: BTreeSet<(ColliderId, ColliderId)>,
    next_id: u32,
}

impl ColliderWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Checks if no colliders are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Current bounds of a collider.
    #[must_use]
    pub fn bounds(&self, collider: ColliderId) -> Option<Aabb> {
        self.colliders.get(&collider).map(|entry| entry.bounds)
    }

    /// Checks if a collider exists and is enabled.
    #[must_use]
    pub fn is_enabled(&self, collider: ColliderId) -> bool {
        self.colliders.get(&collider).is_some_and(|entry| entry.enabled)
    }

    /// Diffs the current overlapping pairs against the previous call.
    ///
    /// Every pair produces a notification for both colliders. Disabled or
    /// removed colliders end their pairs.
    pub fn collect_events(&mut self) -> Vec<OverlapEvent> {
        let enabled: Vec<(ColliderId, Aabb)> = self
            .colliders
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(id, entry)| (*id, entry.bounds))
            .collect();

        let mut now = BTreeSet::new();
        for (i, (a, a_bounds)) in enabled.iter().enumerate() {
            for (b, b_bounds) in &enabled[i + 1..] {
                if a_bounds.overlaps(b_bounds) {
                    now.insert((*a, *b));
                }
            }
        }

        let mut events = Vec::new();
        for &(a, b) in self.touching.difference(&now) {
            events.push(OverlapEvent::End { this: a, other: b });
            events.push(OverlapEvent::End { this: b, other: a });
        }
        for &(a, b) in now.difference(&self.touching) {
            events.push(OverlapEvent::Begin { this: a, other: b });
            events.push(OverlapEvent::Begin { this: b, other: a });
        }

        self.touching = now;
        events
    }
}

impl PhysicsWorld for ColliderWorld {
    fn add_collider(&mut self, center: Vec2, half_extents: Vec2) -> ColliderId {
        self.next_id += 1;
        let id = ColliderId::new(self.next_id);
        self.colliders.insert(
            id,
            ColliderEntry {
                bounds: Aabb::new(center, half_extents),
                enabled: true,
            },
        );
        id
    }

    fn remove_collider(&mut self, collider: ColliderId) {
        self.colliders.remove(&collider);
    }

    fn overlap_box(&self, center: Vec2, half_extents: Vec2) -> Vec<ColliderId> {
        let region = Aabb::new(center, half_extents);
        self.colliders
            .iter()
            .filter(|(_, entry)| entry.enabled && entry.bounds.overlaps(&region))
            .map(|(id, _)| *id)
            .collect()
    }

    fn set_collider_enabled(&mut self, collider: ColliderId, enabled: bool) {
        if let Some(entry) = self.colliders.get_mut(&collider) {
            entry.enabled = enabled;
        }
    }

    fn set_collider_center(&mut self, collider: ColliderId, center: Vec2) {
        if let Some(entry) = self.colliders.get_mut(&collider) {
            entry.bounds.center = center;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(1.0));
        let b = Aabb::new(Vec2::new(1.5, 0.0), Vec2::splat(1.0));
        let c = Aabb::new(Vec2::new(2.0, 0.0), Vec2::splat(1.0));

        assert!(a.overlaps(&b));
        // Touching edges
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_overlap_box_skips_disabled() {
        let mut world = ColliderWorld::new();
        let a = world.add_collider(Vec2::ZERO, Vec2::splat(0.5));
        let b = world.add_collider(Vec2::new(0.2, 0.0), Vec2::splat(0.5));
        let far = world.add_collider(Vec2::new(10.0, 0.0), Vec2::splat(0.5));

        let hits = world.overlap_box(Vec2::ZERO, Vec2::splat(1.0));
        assert_eq!(hits, vec![a, b]);
        assert!(!hits.contains(&far));

        world.set_collider_enabled(b, false);
        assert_eq!(world.overlap_box(Vec2::ZERO, Vec2::splat(1.0)), vec![a]);
    }

    #[test]
    fn test_collect_events_begin_and_end() {
        let mut world = ColliderWorld::new();
        let a = world.add_collider(Vec2::ZERO, Vec2::splat(0.5));
        let b = world.add_collider(Vec2::new(5.0, 0.0), Vec2::splat(0.5));
        assert!(world.collect_events().is_empty());

        world.set_collider_center(b, Vec2::new(0.5, 0.0));
        let events = world.collect_events();
        assert_eq!(
            events,
            vec![
                OverlapEvent::Begin { this: a, other: b },
                OverlapEvent::Begin { this: b, other: a },
            ]
        );

        // Persisting overlap emits nothing new
        assert!(world.collect_events().is_empty());

        world.remove_collider(b);
        let events = world.collect_events();
        assert_eq!(
            events,
            vec![
                OverlapEvent::End { this: a, other: b },
                OverlapEvent::End { this: b, other: a },
            ]
        );
    }
}
