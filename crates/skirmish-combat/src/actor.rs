//! Damageable actors and their combat state machine.
//!
//! States: `Normal` → `TemporarilyDisabled` (stagger for hostiles,
//! invincibility for the player) → back to `Normal` when the status timer
//! expires, or → `Dead` once health reaches zero. `Dead` is terminal.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ColliderId, EntityId, Faction};
use tracing::{debug, info};

use crate::config::ActorProfile;
use crate::contact::ContactSet;
use crate::hitbox::Hitbox;
use crate::schedule::DeferredAction;
use crate::status_timer::StatusTimer;

// ============================================================================
// State types
// ============================================================================

/// Which side of the fight an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// The controllable actor.
    Player,
    /// A hostile actor.
    Hostile,
}

impl ActorKind {
    /// Faction label used for target filtering.
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            Self::Player => Faction::Player,
            Self::Hostile => Faction::Enemy,
        }
    }

    /// Disabled state entered after a non-lethal hit.
    #[must_use]
    pub const fn disable_kind(self) -> DisableKind {
        match self {
            Self::Player => DisableKind::Invincible,
            Self::Hostile => DisableKind::Staggered,
        }
    }
}

/// Flavor of a temporary disabled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisableKind {
    /// Cannot move or attack. Still takes discrete hits.
    Staggered,
    /// Ignores all damage.
    Invincible,
}

/// Combat state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    /// Free to act.
    Normal,
    /// Inside a stagger or invincibility window.
    TemporarilyDisabled(DisableKind),
    /// Terminal.
    Dead,
}

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing negative x.
    Left,
    /// Facing positive x.
    Right,
}

impl Facing {
    /// The other direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// +1 for right, -1 for left.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Presentation pose the rendering layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pose {
    /// Standing still.
    Idle,
    /// Walking or running.
    Moving,
    /// Playing an attack.
    Attacking,
    /// Playing the death animation.
    Dead,
}

/// Why a damage request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuppressReason {
    /// The actor is already dead.
    Dead,
    /// The actor is invincible.
    Invincible,
}

/// Result of [`DamageableActor::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Nothing happened.
    Suppressed(SuppressReason),
    /// Damage applied and a disabled window started.
    Disabled {
        /// Health actually removed.
        dealt: i32,
        /// Health left.
        health: i32,
        /// Window entered.
        kind: DisableKind,
    },
    /// Damage applied and the actor died.
    Killed {
        /// Health actually removed.
        dealt: i32,
    },
}

/// Result of [`DamageableActor::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActorTick {
    /// No visible change.
    Steady,
    /// Still disabled; presentation should use this opacity.
    Blinking(f32),
    /// The disabled window just ended.
    Recovered,
    /// The death grace elapsed; remove the actor.
    RemovalDue,
}

// ============================================================================
// Attack wind-up
// ============================================================================

/// Cooldown gate and pending wind-up for an actor's attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackController {
    /// Minimum seconds between attacks.
    pub cooldown: f32,
    /// Clock time of the last accepted attack.
    last_attack_at: Option<f32>,
    /// Attack triggered but hitbox not yet live.
    windup_pending: bool,
}

impl AttackController {
    /// Create a controller with the given cooldown.
    #[must_use]
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown: cooldown.max(0.0),
            last_attack_at: None,
            windup_pending: false,
        }
    }

    /// Check if the cooldown allows an attack at `now`.
    #[must_use]
    pub fn ready(&self, now: f32) -> bool {
        self.last_attack_at
            .map_or(true, |last| now - last >= self.cooldown)
    }

    /// Start a wind-up if the cooldown allows it.
    pub fn try_start(&mut self, now: f32) -> bool {
        if !self.ready(now) {
            return false;
        }
        self.last_attack_at = Some(now);
        self.windup_pending = true;
        true
    }

    /// The hazard went live; the wind-up is over.
    pub fn finish_windup(&mut self) {
        self.windup_pending = false;
    }

    /// Discard a pending wind-up.
    pub fn cancel(&mut self) {
        self.windup_pending = false;
    }

    /// Check if a wind-up is pending.
    #[must_use]
    pub fn is_winding_up(&self) -> bool {
        self.windup_pending
    }
}

// ============================================================================
// Damageable actor
// ============================================================================

/// An actor that can be damaged, staggered, made invincible, and killed.
#[derive(Debug, Clone)]
pub struct DamageableActor {
    id: EntityId,
    kind: ActorKind,
    max_health: i32,
    health: i32,
    state: ActorState,
    disable_timer: StatusTimer,
    disable_duration: f32,
    removal_timer: StatusTimer,
    death_grace: f32,
    facing: Facing,
    mirror_x: bool,
    position: Vec2,
    velocity: Vec2,
    move_speed: f32,
    sprint_speed: f32,
    pose: Pose,
    body: Option<ColliderId>,
    hitbox: Option<Hitbox>,
    attack: AttackController,
    contacts: Option<ContactSet>,
}

impl DamageableActor {
    /// Create an actor at full health, facing right.
    #[must_use]
    pub fn new(id: EntityId, kind: ActorKind, profile: &ActorProfile, position: Vec2) -> Self {
        let max_health = profile.max_health.max(1);
        Self {
            id,
            kind,
            max_health,
            health: max_health,
            state: ActorState::Normal,
            disable_timer: StatusTimer::new(),
            disable_duration: profile.disable_duration.max(0.0),
            removal_timer: StatusTimer::new(),
            death_grace: profile.death_grace.max(0.0),
            facing: Facing::Right,
            mirror_x: false,
            position,
            velocity: Vec2::ZERO,
            move_speed: profile.move_speed,
            sprint_speed: profile.sprint_speed,
            pose: Pose::Idle,
            body: None,
            hitbox: None,
            attack: AttackController::new(profile.attack_cooldown),
            contacts: None,
        }
    }

    /// Attach the body (hurtbox) collider.
    #[must_use]
    pub fn with_body(mut self, body: Option<ColliderId>) -> Self {
        self.body = body;
        self
    }

    /// Attach a weapon hazard.
    #[must_use]
    pub fn with_hitbox(mut self, hitbox: Option<Hitbox>) -> Self {
        self.hitbox = hitbox;
        self
    }

    /// Give the actor a contact set so it can receive contact damage.
    #[must_use]
    pub fn with_contacts(mut self) -> Self {
        self.contacts = Some(ContactSet::new());
        self
    }

    /// Actor ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Actor kind.
    #[must_use]
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Current combat state.
    #[must_use]
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Check if the actor is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == ActorState::Dead
    }

    /// Check if the actor is staggered.
    #[must_use]
    pub fn is_staggered(&self) -> bool {
        self.state == ActorState::TemporarilyDisabled(DisableKind::Staggered)
    }

    /// Check if damage requests are currently ignored entirely.
    #[must_use]
    pub fn is_damage_suppressed(&self) -> bool {
        matches!(
            self.state,
            ActorState::Dead | ActorState::TemporarilyDisabled(DisableKind::Invincible)
        )
    }

    /// Check if continuous contact with this actor should not hurt others.
    #[must_use]
    pub fn is_immune_to_contact_damage(&self) -> bool {
        matches!(
            self.state,
            ActorState::Dead | ActorState::TemporarilyDisabled(DisableKind::Staggered)
        )
    }

    /// Status timer of the current disabled window.
    #[must_use]
    pub fn disable_timer(&self) -> &StatusTimer {
        &self.disable_timer
    }

    /// Current facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Presentation mirror flag (sprite flipped horizontally).
    #[must_use]
    pub fn mirror_x(&self) -> bool {
        self.mirror_x
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleport the actor.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current presentation pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Body collider.
    #[must_use]
    pub fn body(&self) -> Option<ColliderId> {
        self.body
    }

    /// Weapon hazard.
    #[must_use]
    pub fn hitbox(&self) -> Option<&Hitbox> {
        self.hitbox.as_ref()
    }

    /// Mutable weapon hazard.
    pub fn hitbox_mut(&mut self) -> Option<&mut Hitbox> {
        self.hitbox.as_mut()
    }

    /// Attack wind-up state.
    #[must_use]
    pub fn attack(&self) -> &AttackController {
        &self.attack
    }

    /// Contact set, if the actor receives contact damage.
    #[must_use]
    pub fn contacts(&self) -> Option<&ContactSet> {
        self.contacts.as_ref()
    }

    /// Mutable contact set.
    pub fn contacts_mut(&mut self) -> Option<&mut ContactSet> {
        self.contacts.as_mut()
    }

    /// Every collider the actor owns.
    pub fn colliders(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.body
            .into_iter()
            .chain(self.hitbox.as_ref().and_then(Hitbox::collider))
    }

    /// Apply a damage request. Negative amounts count as zero.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        match self.state {
            ActorState::Dead => return DamageOutcome::Suppressed(SuppressReason::Dead),
            ActorState::TemporarilyDisabled(DisableKind::Invincible) => {
                debug!(actor = ?self.id, "Damage suppressed by invincibility");
                return DamageOutcome::Suppressed(SuppressReason::Invincible);
            },
            ActorState::Normal | ActorState::TemporarilyDisabled(DisableKind::Staggered) => {},
        }

        let before = self.health;
        self.health = (self.health - amount.max(0)).max(0);
        let dealt = before - self.health;
        debug!(actor = ?self.id, dealt, health = self.health, "Actor took damage");

        if self.health == 0 {
            self.die();
            return DamageOutcome::Killed { dealt };
        }

        let kind = self.kind.disable_kind();
        self.state = ActorState::TemporarilyDisabled(kind);
        self.disable_timer.start(self.disable_duration);
        if kind == DisableKind::Staggered {
            self.attack.cancel();
            if let Some(hitbox) = self.hitbox.as_mut() {
                hitbox.deactivate();
            }
            self.velocity = Vec2::ZERO;
            self.pose = Pose::Idle;
        }

        DamageOutcome::Disabled {
            dealt,
            health: self.health,
            kind,
        }
    }

    fn die(&mut self) {
        info!(actor = ?self.id, kind = ?self.kind, "Actor died");
        self.state = ActorState::Dead;
        self.health = 0;
        self.velocity = Vec2::ZERO;
        self.disable_timer.stop();
        self.attack.cancel();
        if let Some(hitbox) = self.hitbox.as_mut() {
            hitbox.deactivate();
        }
        self.pose = Pose::Dead;
        self.removal_timer.start(self.death_grace);
    }

    /// Advance status timers by `dt`.
    ///
    /// `elapsed` is total simulated time, used for the blink phase.
    pub fn tick(&mut self, dt: f32, elapsed: f32, blink_frequency: f32) -> ActorTick {
        match self.state {
            ActorState::Normal => ActorTick::Steady,
            ActorState::TemporarilyDisabled(kind) => {
                if kind == DisableKind::Staggered {
                    self.velocity = Vec2::ZERO;
                }
                if self.disable_timer.tick(dt) {
                    debug!(actor = ?self.id, ?kind, "Disabled window ended");
                    self.state = ActorState::Normal;
                    ActorTick::Recovered
                } else {
                    ActorTick::Blinking(StatusTimer::blink_intensity(elapsed, blink_frequency))
                }
            },
            ActorState::Dead => {
                if self.removal_timer.tick(dt) {
                    ActorTick::RemovalDue
                } else {
                    ActorTick::Steady
                }
            },
        }
    }

    /// Toggle facing, mirror the sprite flag, and mirror the hazard offset.
    pub fn flip(&mut self) {
        self.facing = self.facing.flipped();
        self.mirror_x = self.facing == Facing::Left;
        if let Some(hitbox) = self.hitbox.as_mut() {
            hitbox.mirror();
        }
    }

    /// Flip if `direction_x` points away from the current facing.
    pub fn face_towards(&mut self, direction_x: f32) -> bool {
        let wants = if direction_x > 0.0 {
            Facing::Right
        } else if direction_x < 0.0 {
            Facing::Left
        } else {
            return false;
        };

        if wants == self.facing {
            return false;
        }
        self.flip();
        true
    }

    /// Check if movement commands are accepted.
    #[must_use]
    pub fn can_move(&self) -> bool {
        !self.is_dead() && !self.is_staggered()
    }

    /// Set velocity from a movement command.
    ///
    /// Rejected (velocity forced to zero) while staggered or dead. Returns
    /// whether the command was accepted.
    pub fn command_move(&mut self, direction: Vec2, sprint: bool) -> bool {
        if !self.can_move() {
            self.velocity = Vec2::ZERO;
            return false;
        }

        let speed = if sprint {
            self.sprint_speed
        } else {
            self.move_speed
        };
        self.velocity = direction.normalize_or_zero() * speed;
        self.face_towards(direction.x);

        if self.pose != Pose::Attacking {
            self.pose = if self.velocity == Vec2::ZERO {
                Pose::Idle
            } else {
                Pose::Moving
            };
        }
        true
    }

    /// Integrate position over a fixed step. Returns whether the actor moved.
    pub fn integrate(&mut self, dt: f32) -> bool {
        if !self.can_move() || self.velocity == Vec2::ZERO {
            return false;
        }
        self.position += self.velocity * dt;
        true
    }

    /// Start an attack wind-up if allowed at clock time `now`.
    pub fn try_attack(&mut self, now: f32) -> bool {
        if !self.can_move() || self.hitbox.is_none() {
            return false;
        }
        if !self.attack.try_start(now) {
            return false;
        }
        self.pose = Pose::Attacking;
        true
    }

    /// Switch the hazard on. Returns the deferred scan to schedule.
    ///
    /// A staggered actor cannot attack, so late activations are refused.
    pub fn activate_hitbox(&mut self) -> Option<DeferredAction> {
        if self.is_dead() || self.is_staggered() {
            return None;
        }
        self.attack.finish_windup();
        self.hitbox.as_mut().and_then(Hitbox::activate)
    }

    /// Switch the hazard off and end the attack pose.
    pub fn deactivate_hitbox(&mut self) {
        if let Some(hitbox) = self.hitbox.as_mut() {
            hitbox.deactivate();
        }
        if self.pose == Pose::Attacking {
            self.pose = Pose::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HitboxProfile;
    use proptest::prelude::*;

    fn hostile(max_health: i32) -> DamageableActor {
        let profile = ActorProfile::hostile().with_max_health(max_health);
        let id = EntityId::from_raw(10);
        let hitbox = Hitbox::new(id, Faction::Enemy, &HitboxProfile::default());
        DamageableActor::new(id, ActorKind::Hostile, &profile, Vec2::ZERO)
            .with_hitbox(Some(hitbox))
    }

    fn player() -> DamageableActor {
        let profile = ActorProfile::player();
        DamageableActor::new(EntityId::from_raw(1), ActorKind::Player, &profile, Vec2::ZERO)
    }

    #[test]
    fn test_stagger_then_recover_then_die() {
        let mut actor = hostile(50);

        let outcome = actor.take_damage(20);
        assert_eq!(
            outcome,
            DamageOutcome::Disabled {
                dealt: 20,
                health: 30,
                kind: DisableKind::Staggered,
            }
        );
        assert!(actor.is_staggered());
        assert!(actor.is_immune_to_contact_damage());

        assert!(matches!(actor.tick(0.5, 0.5, 10.0), ActorTick::Blinking(_)));
        assert_eq!(actor.tick(0.5, 1.0, 10.0), ActorTick::Recovered);
        assert_eq!(actor.state(), ActorState::Normal);

        assert_eq!(actor.take_damage(40), DamageOutcome::Killed { dealt: 30 });
        assert_eq!(actor.health(), 0);
        assert!(actor.is_dead());
    }

    #[test]
    fn test_invincible_player_ignores_damage() {
        let mut actor = player();
        actor.take_damage(10);
        assert_eq!(
            actor.state(),
            ActorState::TemporarilyDisabled(DisableKind::Invincible)
        );
        assert!(!actor.is_immune_to_contact_damage());

        assert_eq!(
            actor.take_damage(50),
            DamageOutcome::Suppressed(SuppressReason::Invincible)
        );
        assert_eq!(actor.health(), 90);
    }

    #[test]
    fn test_staggered_hostile_still_takes_hits() {
        let mut actor = hostile(50);
        actor.take_damage(10);
        actor.tick(0.9, 0.9, 10.0);

        // Hit again mid-stagger restarts the window
        actor.take_damage(10);
        assert_eq!(actor.health(), 30);
        assert!(matches!(actor.tick(0.9, 1.8, 10.0), ActorTick::Blinking(_)));
        assert_eq!(actor.tick(0.2, 2.0, 10.0), ActorTick::Recovered);
    }

    #[test]
    fn test_stagger_interrupts_attack() {
        let mut actor = hostile(50);
        assert!(actor.try_attack(0.0));
        assert!(actor.attack().is_winding_up());
        assert!(actor.activate_hitbox().is_some());
        assert!(actor.hitbox().is_some_and(Hitbox::is_active));

        actor.take_damage(5);
        assert!(!actor.attack().is_winding_up());
        assert!(actor.hitbox().is_some_and(|h| !h.is_active()));
        assert_eq!(actor.pose(), Pose::Idle);
    }

    #[test]
    fn test_staggered_actor_cannot_activate_hitbox() {
        let mut actor = hostile(50);
        assert!(actor.try_attack(0.0));
        actor.take_damage(5);

        assert!(actor.activate_hitbox().is_none());
        assert!(actor.hitbox().is_some_and(|h| !h.is_active()));
    }

    #[test]
    fn test_staggered_actor_cannot_move_or_attack() {
        let mut actor = hostile(50);
        actor.take_damage(5);

        assert!(!actor.command_move(Vec2::X, false));
        assert_eq!(actor.velocity(), Vec2::ZERO);
        assert!(!actor.integrate(1.0));
        assert!(!actor.try_attack(10.0));
    }

    #[test]
    fn test_attack_cooldown() {
        let mut actor = hostile(50);
        assert!(actor.try_attack(0.0));
        actor.deactivate_hitbox();
        assert!(!actor.try_attack(1.0));
        assert!(actor.try_attack(1.5));
    }

    #[test]
    fn test_death_is_terminal() {
        let mut actor = hostile(20);
        actor.try_attack(0.0);
        actor.activate_hitbox();

        assert_eq!(actor.take_damage(25), DamageOutcome::Killed { dealt: 20 });
        assert_eq!(actor.pose(), Pose::Dead);
        assert!(actor.hitbox().is_some_and(|h| !h.is_active()));
        assert_eq!(
            actor.take_damage(5),
            DamageOutcome::Suppressed(SuppressReason::Dead)
        );
        assert!(actor.activate_hitbox().is_none());
        assert!(!actor.command_move(Vec2::X, true));

        assert_eq!(actor.tick(0.5, 0.5, 10.0), ActorTick::Steady);
        assert_eq!(actor.tick(0.5, 1.0, 10.0), ActorTick::RemovalDue);
        assert!(actor.is_dead());
    }

    #[test]
    fn test_flip_mirrors_hitbox() {
        let mut actor = hostile(50);
        let offset = actor.hitbox().map(Hitbox::offset).unwrap_or_default();

        actor.flip();
        assert_eq!(actor.facing(), Facing::Left);
        assert!(actor.mirror_x());
        assert_eq!(actor.hitbox().map(Hitbox::offset), Some(Vec2::new(-offset.x, offset.y)));

        assert!(actor.face_towards(1.0));
        assert_eq!(actor.facing(), Facing::Right);
        assert!(!actor.face_towards(1.0));
        assert!(!actor.face_towards(0.0));
    }

    #[test]
    fn test_move_command_sets_velocity_and_facing() {
        let mut actor = player();
        assert!(actor.command_move(Vec2::new(-3.0, 0.0), false));
        assert_eq!(actor.velocity(), Vec2::new(-5.0, 0.0));
        assert_eq!(actor.facing(), Facing::Left);
        assert_eq!(actor.pose(), Pose::Moving);

        actor.command_move(Vec2::new(0.0, 1.0), true);
        assert_eq!(actor.velocity(), Vec2::new(0.0, 8.0));

        assert!(actor.integrate(0.5));
        assert_eq!(actor.position(), Vec2::new(0.0, 4.0));
    }

    #[test]
    fn test_negative_damage_is_zero() {
        let mut actor = hostile(50);
        let outcome = actor.take_damage(-30);
        assert_eq!(
            outcome,
            DamageOutcome::Disabled {
                dealt: 0,
                health: 50,
                kind: DisableKind::Staggered,
            }
        );
    }

    proptest! {
        #[test]
        fn prop_health_bounded_and_death_terminal(
            max_health in 1i32..200,
            hits in proptest::collection::vec(0i32..60, 0..40),
        ) {
            let mut actor = hostile(max_health);
            let mut cumulative = 0i64;

            for amount in &hits {
                let was_dead = actor.is_dead();
                let before = actor.health();
                actor.take_damage(*amount);
                prop_assert!(actor.health() >= 0);
                prop_assert_eq!(actor.health() == 0, actor.is_dead());

                if was_dead {
                    prop_assert_eq!(actor.health(), before);
                    prop_assert!(actor.is_dead());
                } else {
                    cumulative += i64::from(*amount);
                }
            }

            prop_assert_eq!(actor.is_dead(), cumulative >= i64::from(max_health));
        }
    }
}
