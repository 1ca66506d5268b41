//! Scripted encounter.
//!
//! One player surrounded by hostiles. The script plays the role of the input,
//! steering, and animation layers: it issues movement commands, starts
//! attacks, and switches hitboxes on and off after a wind-up. Everything
//! combat-related is left to the core.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use anyhow::Result;
use glam::Vec2;
use serde::Serialize;
use skirmish_combat::{
    ActorKind, ActorState, ColliderWorld, CombatEvent, CombatWorld, DamageableActor, Facing,
};
use skirmish_common::{EntityId, SkirmishError, SkirmishResult};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::timing::FrameTiming;

/// An attack in progress, driven by the script.
#[derive(Debug, Clone, Copy)]
struct Swing {
    elapsed: f32,
    live: bool,
}

/// Final state of one actor.
#[derive(Debug, Clone, Serialize)]
pub struct ActorSummary {
    /// Raw entity id
    pub id: u64,
    /// Player or hostile
    pub kind: ActorKind,
    /// Health left
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Combat state at the end of the run
    pub state: ActorState,
    /// Final position
    pub position: [f32; 2],
}

/// What happened during an encounter.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSummary {
    /// Simulated seconds
    pub simulated_secs: f32,
    /// Variable-rate frames run
    pub frames: u64,
    /// Fixed-rate steps run
    pub fixed_steps: u64,
    /// Average simulated frame rate
    pub average_fps: f32,
    /// Presentation events by name
    pub event_counts: BTreeMap<&'static str, u64>,
    /// Actors removed after dying
    pub removed: usize,
    /// Actors still present at the end
    pub actors: Vec<ActorSummary>,
}

impl EncounterSummary {
    /// Render as pretty JSON.
    pub fn to_json(&self) -> SkirmishResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SkirmishError::Serialization(e.to_string()))
    }
}

/// A running encounter.
#[derive(Debug)]
pub struct Encounter {
    world: CombatWorld<ColliderWorld>,
    timing: FrameTiming,
    config: SimConfig,
    player: EntityId,
    hostiles: Vec<EntityId>,
    swings: BTreeMap<EntityId, Swing>,
    event_counts: BTreeMap<&'static str, u64>,
    frames: u64,
    fixed_steps: u64,
    removed: usize,
}

impl Encounter {
    /// Build the encounter: the player at the origin, hostiles on a ring.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let mut world = CombatWorld::new(ColliderWorld::new(), config.combat.clone());
        let player = world.spawn_actor(ActorKind::Player, Vec2::ZERO);

        let count = config.hostile_count;
        let hostiles = (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count as f32;
                let position = Vec2::from_angle(angle) * config.spawn_radius;
                world.spawn_actor(ActorKind::Hostile, position)
            })
            .collect();

        info!("Encounter ready: 1 player, {} hostiles", count);
        Self {
            world,
            timing: FrameTiming::new(config.target_fps, config.fixed_hz),
            config,
            player,
            hostiles,
            swings: BTreeMap::new(),
            event_counts: BTreeMap::new(),
            frames: 0,
            fixed_steps: 0,
            removed: 0,
        }
    }

    /// The combat world.
    #[must_use]
    pub fn world(&self) -> &CombatWorld<ColliderWorld> {
        &self.world
    }

    /// The player's id.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Run every configured frame and summarize.
    pub fn run(mut self) -> Result<EncounterSummary> {
        for _ in 0..self.config.frame_count() {
            self.step()?;
        }
        info!(
            "Encounter finished after {} frames ({} fixed steps)",
            self.frames, self.fixed_steps
        );
        Ok(self.summary())
    }

    /// Run one frame: script, fixed steps, hitbox timing, overlaps, tick.
    pub fn step(&mut self) -> Result<()> {
        let dt = self.timing.record_frame(self.timing.frame_dt());

        self.drive_player()?;
        self.drive_hostiles()?;

        let fixed_dt = self.timing.fixed_dt();
        for _ in 0..self.timing.accumulate(dt) {
            self.world.fixed_update(fixed_dt);
            self.fixed_steps += 1;
        }

        self.advance_swings(dt)?;

        self.world.sync_overlaps();
        self.world.update(dt);
        self.frames += 1;

        for event in self.world.drain_events() {
            *self.event_counts.entry(event.name()).or_default() += 1;
            if matches!(event, CombatEvent::Removed { .. }) {
                self.removed += 1;
            }
        }
        Ok(())
    }

    fn living(&self, id: EntityId) -> Option<&DamageableActor> {
        self.world.actor(id).filter(|actor| !actor.is_dead())
    }

    fn drive_player(&mut self) -> Result<()> {
        if !self.config.player_attacks || self.swings.contains_key(&self.player) {
            return Ok(());
        }
        let Some(player) = self.living(self.player) else {
            return Ok(());
        };
        let position = player.position();
        let facing = player.facing();

        let nearest = self
            .hostiles
            .iter()
            .filter_map(|&id| self.living(id))
            .map(DamageableActor::position)
            .min_by(|a, b| {
                a.distance_squared(position)
                    .total_cmp(&b.distance_squared(position))
            });
        let Some(target) = nearest else {
            return Ok(());
        };
        if target.distance(position) > self.config.attack_range {
            return Ok(());
        }

        self.face(self.player, facing, target.x - position.x)?;
        if self.world.try_attack(self.player)? {
            self.swings.insert(self.player, Swing { elapsed: 0.0, live: false });
        }
        Ok(())
    }

    fn drive_hostiles(&mut self) -> Result<()> {
        if !self.config.hostiles_chase {
            return Ok(());
        }
        let player_position = self.living(self.player).map(DamageableActor::position);

        for id in self.hostiles.clone() {
            let Some(hostile) = self.living(id) else {
                continue;
            };
            if !hostile.can_move() {
                continue;
            }
            let (position, facing) = (hostile.position(), hostile.facing());

            let Some(target) = player_position else {
                self.world.command_move(id, Vec2::ZERO, false)?;
                continue;
            };
            let offset = target - position;
            let distance = offset.length();

            if distance <= self.config.attack_range {
                self.world.command_move(id, Vec2::ZERO, false)?;
                self.face(id, facing, offset.x)?;
                if self.config.hostiles_attack
                    && !self.swings.contains_key(&id)
                    && self.world.try_attack(id)?
                {
                    self.swings.insert(id, Swing { elapsed: 0.0, live: false });
                }
            } else if distance <= self.config.detection_range {
                self.world.command_move(id, offset, false)?;
            } else {
                self.world.command_move(id, Vec2::ZERO, false)?;
            }
        }
        Ok(())
    }

    fn face(&mut self, id: EntityId, facing: Facing, direction_x: f32) -> Result<()> {
        let wants = if direction_x < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        };
        if wants != facing {
            self.world.flip(id)?;
        }
        Ok(())
    }

    /// Play the animation layer: hitbox on after the wind-up, off after the
    /// active window. Swings of staggered or dead actors are dropped.
    fn advance_swings(&mut self, dt: f32) -> Result<()> {
        let (windup, active) = (self.config.windup_secs, self.config.active_secs);

        for (id, mut swing) in std::mem::take(&mut self.swings) {
            let interrupted = self
                .world
                .actor(id)
                .map_or(true, |actor| !actor.can_move());
            if interrupted {
                debug!("Swing of {:?} interrupted", id);
                continue;
            }

            swing.elapsed += dt;
            if !swing.live && swing.elapsed >= windup {
                self.world.activate_hitbox(id)?;
                swing.live = true;
            }
            if swing.live && swing.elapsed >= windup + active {
                self.world.deactivate_hitbox(id)?;
                continue;
            }
            self.swings.insert(id, swing);
        }
        Ok(())
    }

    fn summary(&self) -> EncounterSummary {
        let actors = self
            .world
            .actors()
            .map(|actor| ActorSummary {
                id: actor.id().raw(),
                kind: actor.kind(),
                health: actor.health(),
                max_health: actor.max_health(),
                state: actor.state(),
                position: actor.position().to_array(),
            })
            .collect();

        EncounterSummary {
            simulated_secs: self.world.elapsed(),
            frames: self.frames,
            fixed_steps: self.fixed_steps,
            average_fps: self.timing.current_fps(),
            event_counts: self.event_counts.clone(),
            removed: self.removed,
            actors,
        }
    }
}
