//! Combat world: owns actors and routes physics notifications into them.
//!
//! Two entry rates drive the world on a single thread:
//! - [`CombatWorld::update`] (variable rate): deferred scans, status timers,
//!   contact damage, removals
//! - [`CombatWorld::fixed_update`] (fixed rate): movement integration
//!
//! Overlap notifications for a tick must be delivered through
//! [`CombatWorld::on_overlap_begin`] / [`CombatWorld::on_overlap_end`] before
//! that tick's `update`, so a just-begun contact is seen by the resolver.

use std::collections::BTreeMap;

use ahash::AHashMap;
use glam::Vec2;
use skirmish_common::{ColliderId, EntityId, Faction};
use tracing::{debug, info, warn};

use crate::actor::{
    ActorKind, ActorState, ActorTick, DamageOutcome, DamageableActor, DisableKind, Pose,
};
use crate::config::{ActorProfile, CombatConfig};
use crate::contact::{ContactDamageResolver, ContactProbe};
use crate::error::{CombatError, CombatResult};
use crate::events::{CombatEvent, EventBus};
use crate::hitbox::{HitReport, Hitbox};
use crate::physics::{ColliderBinding, ColliderRole, ColliderWorld, OverlapEvent, PhysicsWorld};
use crate::schedule::{DeferredAction, Scheduler};

/// Ticks between hitbox activation and its overlap scan.
pub const ACTIVATION_SCAN_DELAY: u32 = 1;

/// Single-threaded combat simulation over a physics collaborator.
#[derive(Debug)]
pub struct CombatWorld<P: PhysicsWorld> {
    physics: P,
    config: CombatConfig,
    actors: BTreeMap<EntityId, DamageableActor>,
    bindings: AHashMap<ColliderId, ColliderBinding>,
    resolvers: Vec<ContactDamageResolver>,
    scheduler: Scheduler,
    events: EventBus,
    elapsed: f32,
    ticks: u64,
}

impl<P: PhysicsWorld> CombatWorld<P> {
    /// Create a world over `physics`. The config is validated first.
    #[must_use]
    pub fn new(physics: P, mut config: CombatConfig) -> Self {
        config.validate();
        let events = EventBus::new(config.event_capacity);
        Self {
            physics,
            config,
            actors: BTreeMap::new(),
            bindings: AHashMap::new(),
            resolvers: Vec::new(),
            scheduler: Scheduler::new(),
            events,
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Physics collaborator.
    #[must_use]
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable physics collaborator.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Presentation event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drain pending presentation events.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Total simulated seconds.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of variable-rate ticks run.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Deferred actions still waiting.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Look up an actor.
    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&DamageableActor> {
        self.actors.get(&id)
    }

    /// Iterate actors in spawn order.
    pub fn actors(&self) -> impl Iterator<Item = &DamageableActor> {
        self.actors.values()
    }

    /// Number of live (not yet removed) actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Capability bound to a collider.
    #[must_use]
    pub fn binding(&self, collider: ColliderId) -> Option<ColliderBinding> {
        self.bindings.get(&collider).copied()
    }

    /// Actor owning a collider.
    pub fn owner_of(&self, collider: ColliderId) -> CombatResult<EntityId> {
        self.bindings
            .get(&collider)
            .map(|binding| binding.owner)
            .ok_or(CombatError::UnknownCollider(collider))
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Spawn an actor with the configured profile for its kind.
    pub fn spawn_actor(&mut self, kind: ActorKind, position: Vec2) -> EntityId {
        let profile = match kind {
            ActorKind::Player => self.config.player.clone(),
            ActorKind::Hostile => self.config.hostile.clone(),
        };
        self.spawn_with_profile(kind, &profile, position)
    }

    /// Spawn an actor with an explicit profile.
    ///
    /// Creates its body and hitbox colliders and binds them. The player also
    /// gets a contact set and a contact-damage resolver.
    pub fn spawn_with_profile(
        &mut self,
        kind: ActorKind,
        profile: &ActorProfile,
        position: Vec2,
    ) -> EntityId {
        let id = EntityId::new();
        let faction = kind.faction();

        let body = (profile.body_half_extents.x > 0.0 && profile.body_half_extents.y > 0.0)
            .then(|| {
                let collider = self.physics.add_collider(position, profile.body_half_extents);
                self.bind(collider, id, faction, ColliderRole::Body);
                collider
            });

        let hitbox = profile.hitbox.as_ref().map(|hitbox_profile| {
            let collider = hitbox_profile.has_shape().then(|| {
                let collider = self.physics.add_collider(
                    position + hitbox_profile.offset,
                    hitbox_profile.half_extents,
                );
                // Hazards stay off until activated
                self.physics.set_collider_enabled(collider, false);
                self.bind(collider, id, faction, ColliderRole::Hitbox);
                collider
            });
            Hitbox::new(id, faction, hitbox_profile).with_collider(collider)
        });

        let mut actor = DamageableActor::new(id, kind, profile, position)
            .with_body(body)
            .with_hitbox(hitbox);

        if kind == ActorKind::Player {
            actor = actor.with_contacts();
            self.resolvers
                .push(ContactDamageResolver::new(id, self.config.contact_damage));
        }

        debug!("Spawned {:?} {:?} at {}", kind, id, position);
        self.actors.insert(id, actor);
        id
    }

    fn bind(
        &mut self,
        collider: ColliderId,
        owner: EntityId,
        faction: Faction,
        role: ColliderRole,
    ) {
        self.bindings.insert(
            collider,
            ColliderBinding {
                owner,
                faction,
                role,
            },
        );
    }

    fn actor_mut(&mut self, id: EntityId) -> CombatResult<&mut DamageableActor> {
        self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))
    }

    // ------------------------------------------------------------------------
    // Animation / movement layer surface
    // ------------------------------------------------------------------------

    /// Switch an actor's hitbox on and schedule its activation-time scan.
    pub fn activate_hitbox(&mut self, id: EntityId) -> CombatResult<()> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))?;
        if actor.is_dead() {
            return Err(CombatError::ActorDead(id));
        }
        if actor.hitbox().is_none() {
            return Err(CombatError::NoHitbox(id));
        }
        if actor.is_staggered() {
            debug!("Ignoring hitbox activation of staggered {:?}", id);
            return Ok(());
        }

        let Some(action) = actor.activate_hitbox() else {
            return Ok(());
        };

        let position = actor.position();
        if let Some(hitbox) = actor.hitbox() {
            match hitbox.collider() {
                Some(collider) => {
                    self.physics
                        .set_collider_center(collider, hitbox.bounds(position).center);
                    self.physics.set_collider_enabled(collider, true);
                },
                None => warn!("Hitbox of {:?} has no overlap shape", id),
            }
        }

        self.scheduler.schedule(action, ACTIVATION_SCAN_DELAY);
        Ok(())
    }

    /// Switch an actor's hitbox off.
    pub fn deactivate_hitbox(&mut self, id: EntityId) -> CombatResult<()> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))?;
        let collider = actor
            .hitbox()
            .ok_or(CombatError::NoHitbox(id))?
            .collider();
        let pose = actor.pose();
        actor.deactivate_hitbox();
        let new_pose = actor.pose();

        if let Some(collider) = collider {
            self.physics.set_collider_enabled(collider, false);
        }
        if new_pose != pose {
            self.events.publish(CombatEvent::PoseChanged {
                entity: id,
                pose: new_pose,
            });
        }
        Ok(())
    }

    /// Deliver a damage request to an actor.
    pub fn take_damage(
        &mut self,
        target: EntityId,
        amount: i32,
        source: Option<EntityId>,
    ) -> CombatResult<DamageOutcome> {
        let actor = self.actor_mut(target)?;
        let outcome = actor.take_damage(amount);
        self.publish_outcome(target, outcome, source);
        Ok(outcome)
    }

    /// Start an attack wind-up if the actor may attack now.
    pub fn try_attack(&mut self, id: EntityId) -> CombatResult<bool> {
        let now = self.elapsed;
        let actor = self.actor_mut(id)?;
        if !actor.try_attack(now) {
            return Ok(false);
        }
        self.events.publish(CombatEvent::AttackStarted { entity: id });
        self.events.publish(CombatEvent::PoseChanged {
            entity: id,
            pose: actor_pose(&self.actors, id),
        });
        Ok(true)
    }

    /// Apply a movement command. Ignored while staggered or dead.
    pub fn command_move(
        &mut self,
        id: EntityId,
        direction: Vec2,
        sprint: bool,
    ) -> CombatResult<bool> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))?;
        let (facing, pose) = (actor.facing(), actor.pose());
        let accepted = actor.command_move(direction, sprint);

        if actor.facing() != facing {
            sync_colliders(&mut self.physics, actor);
            self.events.publish(CombatEvent::FacingChanged {
                entity: id,
                facing: actor.facing(),
            });
        }
        if actor.pose() != pose {
            self.events.publish(CombatEvent::PoseChanged {
                entity: id,
                pose: actor.pose(),
            });
        }
        Ok(accepted)
    }

    /// Turn an actor around, mirroring its hazard.
    pub fn flip(&mut self, id: EntityId) -> CombatResult<()> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))?;
        actor.flip();
        sync_colliders(&mut self.physics, actor);
        self.events.publish(CombatEvent::FacingChanged {
            entity: id,
            facing: actor.facing(),
        });
        Ok(())
    }

    /// Teleport an actor and its colliders.
    pub fn set_actor_position(&mut self, id: EntityId, position: Vec2) -> CombatResult<()> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::UnknownActor(id))?;
        actor.set_position(position);
        sync_colliders(&mut self.physics, actor);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Physics notifications
    // ------------------------------------------------------------------------

    /// `other` started overlapping `this`.
    pub fn on_overlap_begin(&mut self, this: ColliderId, other: ColliderId) {
        let Some(this_binding) = self.bindings.get(&this).copied() else {
            debug!("Overlap begin on unbound collider {:?}", this);
            return;
        };
        let Some(other_binding) = self.bindings.get(&other).copied() else {
            debug!("Overlap with unbound collider {:?}", other);
            return;
        };
        let Some(actor) = self.actors.get_mut(&this_binding.owner) else {
            warn!("Collider {:?} has no actor attached", this);
            return;
        };

        match this_binding.role {
            ColliderRole::Hitbox => {
                let report = actor
                    .hitbox_mut()
                    .and_then(|hitbox| hitbox.on_overlap_begin(&other_binding));
                if let Some(report) = report {
                    self.deliver_hit(report);
                }
            },
            ColliderRole::Body => {
                let hostile = this_binding.faction.opponent();
                if let Some(contacts) = actor.contacts_mut() {
                    if other_binding.is_body_of(hostile) && contacts.insert(other) {
                        debug!("{:?} touching {:?}", this_binding.owner, other_binding.owner);
                    }
                }
            },
        }
    }

    /// `other` stopped overlapping `this`.
    pub fn on_overlap_end(&mut self, this: ColliderId, other: ColliderId) {
        let Some(binding) = self.bindings.get(&this).copied() else {
            return;
        };
        if binding.role != ColliderRole::Body {
            return;
        }
        if let Some(contacts) = self
            .actors
            .get_mut(&binding.owner)
            .and_then(DamageableActor::contacts_mut)
        {
            contacts.remove(other);
        }
    }

    /// Dispatch a batch of overlap notifications in order.
    pub fn handle_overlap_events<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = OverlapEvent>,
    {
        for event in events {
            match event {
                OverlapEvent::Begin { this, other } => self.on_overlap_begin(this, other),
                OverlapEvent::End { this, other } => self.on_overlap_end(this, other),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    /// Variable-rate tick.
    ///
    /// Order: deferred scans, status timers, contact damage, removals.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.ticks += 1;

        for action in self.scheduler.advance() {
            self.run_deferred(action);
        }

        let removals = self.tick_actors(dt);
        self.resolve_contacts();

        for id in removals {
            self.remove_actor(id);
        }
    }

    /// Fixed-rate tick: integrate movement and move colliders along.
    pub fn fixed_update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for actor in self.actors.values_mut() {
            if actor.integrate(dt) {
                sync_colliders(&mut self.physics, actor);
            }
        }
    }

    fn run_deferred(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::ScanHitbox { owner, activation } => {
                let Some(actor) = self.actors.get_mut(&owner) else {
                    debug!("Deferred scan for removed actor {:?}", owner);
                    return;
                };
                let position = actor.position();
                let Some(hitbox) = actor.hitbox_mut() else {
                    return;
                };
                if !hitbox.is_active() || hitbox.activation() != activation {
                    debug!("Hitbox of {:?} deactivated before its scan", owner);
                    return;
                }
                if hitbox.collider().is_none() {
                    warn!("Hitbox of {:?} has no overlap shape, skipping scan", owner);
                    return;
                }

                let bounds = hitbox.bounds(position);
                let bindings = &self.bindings;
                let overlapping = self
                    .physics
                    .overlap_box(bounds.center, bounds.half_extents)
                    .into_iter()
                    .filter_map(|collider| {
                        let binding = bindings.get(&collider).copied();
                        if binding.is_none() {
                            debug!("Scan of {:?} found unbound collider {:?}", owner, collider);
                        }
                        binding
                    });
                let reports = hitbox.scan(activation, overlapping);

                for report in reports {
                    self.deliver_hit(report);
                }
            },
        }
    }

    fn deliver_hit(&mut self, report: HitReport) {
        let Some(target) = self.actors.get_mut(&report.target) else {
            warn!("Struck collider of {:?} has no actor attached", report.target);
            return;
        };
        debug!(
            "Hitbox of {:?} struck {:?} for {}",
            report.attacker, report.target, report.damage
        );
        let outcome = target.take_damage(report.damage);
        if !matches!(outcome, DamageOutcome::Suppressed(_)) {
            self.events.publish(CombatEvent::HitLanded {
                attacker: report.attacker,
                target: report.target,
            });
        }
        self.publish_outcome(report.target, outcome, Some(report.attacker));
    }

    fn publish_outcome(
        &mut self,
        target: EntityId,
        outcome: DamageOutcome,
        source: Option<EntityId>,
    ) {
        match outcome {
            DamageOutcome::Suppressed(_) => {
                self.events.publish(CombatEvent::DamageSuppressed { target });
            },
            DamageOutcome::Disabled { dealt, health, kind } => {
                self.events.publish(CombatEvent::Damaged {
                    target,
                    amount: dealt,
                    health,
                    source,
                });
                match kind {
                    DisableKind::Staggered => {
                        self.disable_hazard(target);
                        self.events.publish(CombatEvent::Staggered { entity: target });
                        self.events.publish(CombatEvent::PoseChanged {
                            entity: target,
                            pose: actor_pose(&self.actors, target),
                        });
                    },
                    DisableKind::Invincible => {
                        self.events
                            .publish(CombatEvent::InvincibilityStarted { entity: target });
                    },
                }
            },
            DamageOutcome::Killed { dealt } => {
                self.events.publish(CombatEvent::Damaged {
                    target,
                    amount: dealt,
                    health: 0,
                    source,
                });
                if let Some(actor) = self.actors.get(&target) {
                    for collider in actor.colliders() {
                        self.physics.set_collider_enabled(collider, false);
                    }
                }
                self.events.publish(CombatEvent::Died { entity: target });
                self.events.publish(CombatEvent::PoseChanged {
                    entity: target,
                    pose: actor_pose(&self.actors, target),
                });
            },
        }
    }

    fn disable_hazard(&mut self, id: EntityId) {
        let collider = self
            .actors
            .get(&id)
            .and_then(DamageableActor::hitbox)
            .and_then(Hitbox::collider);
        if let Some(collider) = collider {
            self.physics.set_collider_enabled(collider, false);
        }
    }

    fn tick_actors(&mut self, dt: f32) -> Vec<EntityId> {
        let elapsed = self.elapsed;
        let frequency = self.config.blink_frequency;
        let mut removals = Vec::new();

        for actor in self.actors.values_mut() {
            let before = actor.state();
            match actor.tick(dt, elapsed, frequency) {
                ActorTick::Steady => {},
                ActorTick::Blinking(alpha) => {
                    self.events.publish(CombatEvent::BlinkIntensity {
                        entity: actor.id(),
                        alpha,
                    });
                },
                ActorTick::Recovered => {
                    self.events.publish(CombatEvent::BlinkIntensity {
                        entity: actor.id(),
                        alpha: 1.0,
                    });
                    if let ActorState::TemporarilyDisabled(kind) = before {
                        self.events.publish(CombatEvent::Recovered {
                            entity: actor.id(),
                            kind,
                        });
                    }
                },
                ActorTick::RemovalDue => removals.push(actor.id()),
            }
        }
        removals
    }

    fn resolve_contacts(&mut self) {
        for resolver in self.resolvers.clone() {
            let receiver = resolver.receiver();
            let Some(mut contacts) = self
                .actors
                .get_mut(&receiver)
                .and_then(DamageableActor::contacts_mut)
                .map(std::mem::take)
            else {
                continue;
            };

            let (actors, bindings) = (&self.actors, &self.bindings);
            let source = resolver.evaluate(&mut contacts, |collider| {
                let Some(binding) = bindings.get(&collider) else {
                    return ContactProbe::Stale;
                };
                match actors.get(&binding.owner) {
                    None => ContactProbe::Stale,
                    Some(actor) if actor.is_immune_to_contact_damage() => ContactProbe::Immune,
                    Some(actor) => ContactProbe::Hostile(actor.id()),
                }
            });

            let Some(actor) = self.actors.get_mut(&receiver) else {
                continue;
            };
            if let Some(slot) = actor.contacts_mut() {
                *slot = contacts;
            }

            // Invincibility from an earlier contact hit covers this tick
            if actor.is_damage_suppressed() {
                continue;
            }
            if let Some(source) = source {
                debug!("Contact damage from {:?} to {:?}", source, receiver);
                if let Err(err) = self.take_damage(receiver, resolver.amount(), Some(source)) {
                    warn!("Contact damage failed: {err}");
                }
            }
        }
    }

    fn remove_actor(&mut self, id: EntityId) {
        let Some(actor) = self.actors.remove(&id) else {
            return;
        };
        for collider in actor.colliders() {
            self.physics.remove_collider(collider);
            self.bindings.remove(&collider);
        }
        self.resolvers.retain(|resolver| resolver.receiver() != id);
        info!("Removed {:?} {:?}", actor.kind(), id);
        self.events.publish(CombatEvent::Removed { entity: id });
    }
}

impl CombatWorld<ColliderWorld> {
    /// Pull overlap notifications from the built-in physics world and
    /// dispatch them.
    pub fn sync_overlaps(&mut self) {
        let events = self.physics.collect_events();
        self.handle_overlap_events(events);
    }
}

fn actor_pose(actors: &BTreeMap<EntityId, DamageableActor>, id: EntityId) -> Pose {
    actors.get(&id).map_or(Pose::Idle, DamageableActor::pose)
}

fn sync_colliders<P: PhysicsWorld>(physics: &mut P, actor: &DamageableActor) {
    let position = actor.position();
    if let Some(body) = actor.body() {
        physics.set_collider_center(body, position);
    }
    if let Some(hitbox) = actor.hitbox() {
        if let Some(collider) = hitbox.collider() {
            physics.set_collider_center(collider, hitbox.bounds(position).center);
        }
    }
}
