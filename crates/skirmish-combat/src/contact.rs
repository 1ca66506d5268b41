//! Continuous contact damage.
//!
//! Unlike a hitbox strike, contact damage comes from sustained body overlap.
//! The receiving actor owns a [`ContactSet`] fed by overlap begin/end
//! notifications; a [`ContactDamageResolver`] polls it once per tick.

use std::collections::BTreeSet;

use skirmish_common::{ColliderId, EntityId};
use tracing::debug;

/// Hostile colliders currently touching an actor's body.
#[derive(Debug, Clone, Default)]
pub struct ContactSet {
    members: BTreeSet<ColliderId>,
}

impl ContactSet {
    /// Create an empty contact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an overlap start. Returns `false` if already present.
    pub fn insert(&mut self, collider: ColliderId) -> bool {
        self.members.insert(collider)
    }

    /// Record an overlap end. Returns `false` if it was not present.
    pub fn remove(&mut self, collider: ColliderId) -> bool {
        self.members.remove(&collider)
    }

    /// Check if a collider is in contact.
    #[must_use]
    pub fn contains(&self, collider: ColliderId) -> bool {
        self.members.contains(&collider)
    }

    /// Iterate members in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.members.iter().copied()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if nothing is in contact.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drop members for which `keep` returns `false`.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&ColliderId) -> bool,
    {
        self.members.retain(keep);
    }
}

/// What the world knows about a contact-set member this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactProbe {
    /// The collider or its actor no longer exists.
    Stale,
    /// The actor exists but cannot hurt by contact (staggered or dead).
    Immune,
    /// The actor can hurt by contact.
    Hostile(EntityId),
}

/// Applies at most one fixed contact-damage hit per tick to one receiver.
///
/// There is no cooldown here: the receiver's own invincibility window, started
/// by the damage just applied, suppresses the following ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactDamageResolver {
    receiver: EntityId,
    amount: i32,
}

impl ContactDamageResolver {
    /// Create a resolver bound to the receiving actor.
    #[must_use]
    pub fn new(receiver: EntityId, amount: i32) -> Self {
        Self {
            receiver,
            amount: amount.max(0),
        }
    }

    /// The actor taking contact damage.
    #[must_use]
    pub fn receiver(&self) -> EntityId {
        self.receiver
    }

    /// Damage per contact hit.
    #[must_use]
    pub fn amount(&self) -> i32 {
        self.amount
    }

    /// Evaluate the contact set for one tick.
    ///
    /// Stale members are pruned. Returns the first hostile actor able to deal
    /// contact damage, if any; the caller applies [`Self::amount`] once.
    pub fn evaluate<F>(&self, contacts: &mut ContactSet, mut probe: F) -> Option<EntityId>
    where
        F: FnMut(ColliderId) -> ContactProbe,
    {
        let probes: Vec<(ColliderId, ContactProbe)> =
            contacts.iter().map(|collider| (collider, probe(collider))).collect();

        let stale: Vec<ColliderId> = probes
            .iter()
            .filter(|(_, result)| *result == ContactProbe::Stale)
            .map(|(collider, _)| *collider)
            .collect();
        if !stale.is_empty() {
            debug!(receiver = ?self.receiver, count = stale.len(), "Pruning stale contacts");
            contacts.retain(|collider| !stale.contains(collider));
        }

        probes.into_iter().find_map(|(_, result)| match result {
            ContactProbe::Hostile(source) => Some(source),
            ContactProbe::Stale | ContactProbe::Immune => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collider(raw: u32) -> ColliderId {
        ColliderId::new(raw)
    }

    #[test]
    fn test_contact_set_membership() {
        let mut contacts = ContactSet::new();
        assert!(contacts.insert(collider(1)));
        assert!(!contacts.insert(collider(1)));
        assert!(contacts.contains(collider(1)));
        assert!(contacts.remove(collider(1)));
        assert!(!contacts.remove(collider(1)));
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_first_hostile_wins() {
        let resolver = ContactDamageResolver::new(EntityId::from_raw(1), 10);
        let mut contacts = ContactSet::new();
        contacts.insert(collider(1));
        contacts.insert(collider(2));
        contacts.insert(collider(3));

        let source = resolver.evaluate(&mut contacts, |c| match c.raw() {
            1 => ContactProbe::Immune,
            n => ContactProbe::Hostile(EntityId::from_raw(u64::from(n) + 100)),
        });
        assert_eq!(source, Some(EntityId::from_raw(102)));
    }

    #[test]
    fn test_all_immune_deals_nothing() {
        let resolver = ContactDamageResolver::new(EntityId::from_raw(1), 10);
        let mut contacts = ContactSet::new();
        contacts.insert(collider(1));
        contacts.insert(collider(2));

        assert_eq!(resolver.evaluate(&mut contacts, |_| ContactProbe::Immune), None);
        assert_eq!(contacts.len(), 2);
    }

    #[test]
    fn test_stale_members_pruned() {
        let resolver = ContactDamageResolver::new(EntityId::from_raw(1), 10);
        let mut contacts = ContactSet::new();
        contacts.insert(collider(1));
        contacts.insert(collider(2));

        let source = resolver.evaluate(&mut contacts, |c| {
            if c.raw() == 1 {
                ContactProbe::Stale
            } else {
                ContactProbe::Hostile(EntityId::from_raw(7))
            }
        });

        assert_eq!(source, Some(EntityId::from_raw(7)));
        assert!(!contacts.contains(collider(1)));
        assert!(contacts.contains(collider(2)));
    }

    #[test]
    fn test_negative_amount_clamped() {
        let resolver = ContactDamageResolver::new(EntityId::from_raw(1), -4);
        assert_eq!(resolver.amount(), 0);
        assert_eq!(resolver.receiver(), EntityId::from_raw(1));
    }
}
