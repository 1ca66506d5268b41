//! Per-activation record of struck targets.

use ahash::AHashSet;
use skirmish_common::EntityId;

/// Targets already struck by one hitbox during its current activation.
#[derive(Debug, Clone, Default)]
pub struct HitRegistry {
    struck: AHashSet<EntityId>,
}

impl HitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a strike. Returns `false` if the target was already struck.
    pub fn register(&mut self, target: EntityId) -> bool {
        self.struck.insert(target)
    }

    /// Check if a target was already struck.
    #[must_use]
    pub fn contains(&self, target: EntityId) -> bool {
        self.struck.contains(&target)
    }

    /// Forget all strikes.
    pub fn clear(&mut self) {
        self.struck.clear();
    }

    /// Number of targets struck.
    #[must_use]
    pub fn len(&self) -> usize {
        self.struck.len()
    }

    /// Check if nothing has been struck.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.struck.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_register_once() {
        let mut registry = HitRegistry::new();
        let target = EntityId::from_raw(7);

        assert!(registry.register(target));
        assert!(!registry.register(target));
        assert!(registry.contains(target));
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.register(target));
    }

    proptest! {
        #[test]
        fn prop_each_target_registers_exactly_once(
            raw in proptest::collection::vec(1u64..16, 0..64),
        ) {
            let mut registry = HitRegistry::new();
            let accepted = raw
                .iter()
                .filter(|&&id| registry.register(EntityId::from_raw(id)))
                .count();

            let mut distinct = raw.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(accepted, distinct.len());
            prop_assert_eq!(registry.len(), distinct.len());
        }
    }
}
