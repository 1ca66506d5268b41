//! # Skirmish Common
//!
//! Common types, utilities, and shared abstractions for Project Skirmish.
//!
//! This crate provides foundational types used across all Skirmish crates:
//! - ID types (EntityId, ColliderId)
//! - Faction labels used for target filtering
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_faction_opponent() {
        assert_eq!(Faction::Player.opponent(), Faction::Enemy);
        assert_eq!(Faction::Enemy.opponent(), Faction::Player);
        assert_eq!(Faction::Enemy.to_string(), "Enemy");
    }

    #[test]
    fn test_config_parse_error_conversion() {
        let parsed: Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: SkirmishError = parsed.expect_err("invalid toml").into();
        assert!(err.to_string().starts_with("Config parse error"));
    }
}
