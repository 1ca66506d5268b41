//! Harness configuration.
//!
//! Wraps the combat tuning with frame-rate and scenario settings. Loaded from
//! and saved to TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_combat::CombatConfig;
use skirmish_common::SkirmishResult;
use tracing::{info, warn};

/// Harness configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Frame Settings ===
    /// Variable-rate frames per simulated second
    pub target_fps: u32,
    /// Fixed-rate movement steps per simulated second
    pub fixed_hz: u32,
    /// Simulated seconds to run
    pub duration_secs: f32,

    // === Scenario Settings ===
    /// Number of hostile actors placed around the player
    pub hostile_count: u32,
    /// Distance from the player at which hostiles spawn
    pub spawn_radius: f32,
    /// Player swings at the nearest hostile whenever its cooldown allows
    pub player_attacks: bool,
    /// Hostiles walk towards the player when it is within detection range
    pub hostiles_chase: bool,
    /// Hostiles swing when the player is within attack range
    pub hostiles_attack: bool,
    /// Distance at which hostiles notice the player
    pub detection_range: f32,
    /// Distance at which hostiles stop and swing
    pub attack_range: f32,
    /// Seconds between an attack starting and its hitbox going live
    pub windup_secs: f32,
    /// Seconds a hitbox stays live
    pub active_secs: f32,

    // === Combat Tuning ===
    /// Combat core configuration
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Frame
            target_fps: 60,
            fixed_hz: 50,
            duration_secs: 10.0,

            // Scenario
            hostile_count: 3,
            spawn_radius: 3.0,
            player_attacks: true,
            hostiles_chase: true,
            hostiles_attack: true,
            detection_range: 5.0,
            attack_range: 1.2,
            windup_secs: 0.15,
            active_secs: 0.2,

            // Combat
            combat: CombatConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> SkirmishResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::parse(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SkirmishResult<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.target_fps = self.target_fps.clamp(1, 1000);
        self.fixed_hz = self.fixed_hz.clamp(1, 1000);
        self.duration_secs = self.duration_secs.clamp(0.0, 3600.0);

        self.hostile_count = self.hostile_count.min(64);
        self.spawn_radius = self.spawn_radius.max(0.0);
        self.detection_range = self.detection_range.max(0.0);
        self.attack_range = self.attack_range.clamp(0.0, self.detection_range);
        self.windup_secs = self.windup_secs.max(0.0);
        self.active_secs = self.active_secs.max(0.0);

        self.combat.validate();
    }

    /// Number of variable-rate frames to run.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        (self.duration_secs * self.target_fps as f32).round() as u64
    }
}
