//! Tick-driven agent simulation
//!
//! Owns the `hecs` world, the tile graph, the event queue, and a seeded RNG,
//! and runs the fixed tick phases: world update (graph occupancy), AI
//! (behavior per agent, against snapshots taken before any mutation),
//! damage application, and motion. Phase separation keeps tile writes and
//! AI reads from interleaving.

use glam::Vec3;
use hecs::Entity;
use log::{debug, error};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ai::{BehaviorController, BehaviorState, DamageIntent, LocomotionController, MotionCommand, TickInputs};
use crate::config::AgentProfile;
use crate::graph::TileGraph;
use crate::world::{
    AgentEvent, AiPolicy, DamageResponse, EventQueue, ExternalSignals, Health, ObstacleRaycaster,
    OccupancyOracle, Pose, Spawn, TargetSnapshot,
};

/// One simulated world of agents over a tile graph
pub struct Simulation {
    world: hecs::World,
    graph: TileGraph,
    events: EventQueue,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Create a simulation over a built graph. The seed fixes every random
    /// draw (idle durations, wander points, detection and damage rolls), so
    /// identical seeds replay identically.
    #[must_use]
    pub fn new(graph: TileGraph, seed: u64) -> Self {
        Self {
            world: hecs::World::new(),
            graph,
            events: EventQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The entity world
    #[must_use]
    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    /// Mutable access to the entity world
    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    /// The navigation graph
    #[must_use]
    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    /// Mutable access to the navigation graph
    pub fn graph_mut(&mut self) -> &mut TileGraph {
        &mut self.graph
    }

    /// Events emitted during the previous tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Mutable event access, for external producers and draining consumers
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Spawn an agent at `position` with the given profile.
    ///
    /// An invalid profile disables the agent's AI instead of failing the
    /// spawn: the error is logged and the agent stands inert while the rest
    /// of the simulation continues.
    pub fn spawn_agent(&mut self, position: Vec3, facing: Vec3, mut profile: AgentProfile) -> Entity {
        if let Err(err) = profile.validate() {
            error!("disabling agent AI: {err}");
            profile.ai_policy = AiPolicy::None;
        }

        let entity = self.world.spawn((
            Pose::new(position, facing),
            Health::new(profile.max_health),
            Spawn(position),
            ExternalSignals::default(),
            MotionCommand::default(),
            BehaviorController::new(),
            LocomotionController::new(),
            profile,
        ));
        debug!("spawned agent {entity:?} at {position}");
        entity
    }

    /// Set an agent's per-tick external signals
    pub fn set_signals(&mut self, entity: Entity, signals: ExternalSignals) {
        if let Ok(mut current) = self.world.get::<&mut ExternalSignals>(entity) {
            *current = signals;
        }
    }

    /// Assign or clear an agent's interact target
    pub fn set_interact_target(&mut self, entity: Entity, target: Option<Entity>) {
        if let Ok(mut behavior) = self.world.get::<&mut BehaviorController>(entity) {
            behavior.set_interact_target(target);
        }
    }

    /// The behavior state an agent last produced
    #[must_use]
    pub fn agent_state(&self, entity: Entity) -> Option<BehaviorState> {
        self.world
            .get::<&BehaviorController>(entity)
            .map(|b| b.state())
            .ok()
    }

    /// An agent's current pose
    #[must_use]
    pub fn agent_pose(&self, entity: Entity) -> Option<Pose> {
        self.world.get::<&Pose>(entity).map(|p| *p).ok()
    }

    /// An agent's current health
    #[must_use]
    pub fn agent_health(&self, entity: Entity) -> Option<Health> {
        self.world.get::<&Health>(entity).map(|h| *h).ok()
    }

    /// Externally apply damage (player attacks, hazards). Respects the
    /// target's damage response and records the source for death reporting.
    pub fn deal_damage(&mut self, target: Entity, amount: f32, source: Option<Entity>) {
        let immune = self
            .world
            .get::<&AgentProfile>(target)
            .map(|p| p.damage_response == DamageResponse::Immune)
            .unwrap_or(true);
        if immune {
            return;
        }
        if let Ok(mut health) = self.world.get::<&mut Health>(target) {
            if !health.is_alive() {
                return;
            }
            health.current = (health.current - amount).max(0.0);
            health.last_hit_by = source;
            self.events.push(AgentEvent::Damaged {
                entity: target,
                amount,
                source,
            });
        }
    }

    /// Advance the simulation one fixed tick.
    ///
    /// `occupancy` feeds the graph's rescan backstop and `raycaster` serves
    /// locomotion path correction; both normally come from the same
    /// [`NavPhysics`](crate::physics::NavPhysics) instance.
    pub fn tick(&mut self, dt: f32, occupancy: &dyn OccupancyOracle, raycaster: &dyn ObstacleRaycaster) {
        // Tick boundary: last tick's events become readable
        self.events.swap();

        // World-update phase: tile occupancy before any AI reads
        self.graph.tick(dt, occupancy);

        // Snapshot living agents so AI reads a consistent pre-tick view
        let snapshots: Vec<TargetSnapshot> = self
            .world
            .query::<(&Pose, &Health, &MotionCommand)>()
            .iter()
            .filter(|(_, (_, health, _))| health.is_alive())
            .map(|(entity, (pose, _, command))| TargetSnapshot {
                entity,
                position: pose.position,
                velocity: command.velocity,
            })
            .collect();

        // AI phase
        let mut damage: Vec<(Entity, DamageIntent)> = Vec::new();
        let mut motions: Vec<(Entity, MotionCommand)> = Vec::new();
        {
            let Self {
                world,
                graph,
                events,
                rng,
            } = self;

            for (entity, (behavior, locomotion, pose, health, spawn, signals, profile)) in world
                .query_mut::<(
                    &mut BehaviorController,
                    &mut LocomotionController,
                    &Pose,
                    &Health,
                    &Spawn,
                    &ExternalSignals,
                    &AgentProfile,
                )>()
            {
                if profile.ai_policy != AiPolicy::Basic {
                    continue;
                }

                let find = |wanted: Option<Entity>| {
                    wanted.and_then(|w| snapshots.iter().find(|s| s.entity == w).copied())
                };
                let nearest = snapshots
                    .iter()
                    .filter(|s| s.entity != entity)
                    .min_by(|a, b| {
                        let da = pose.position.distance_squared(a.position);
                        let db = pose.position.distance_squared(b.position);
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .copied();

                let inputs = TickInputs {
                    dt,
                    signals: *signals,
                    nearest,
                    current_target: find(behavior.target()),
                    interact: find(behavior.interact_target()),
                };

                let output = behavior.tick(
                    entity,
                    &profile.behavior,
                    &profile.perception,
                    &profile.locomotion,
                    pose,
                    health,
                    spawn,
                    graph,
                    locomotion,
                    raycaster,
                    events,
                    rng,
                    &inputs,
                );

                if let Some(intent) = output.damage {
                    damage.push((entity, intent));
                }
                motions.push((entity, output.command));
            }
        }

        // Damage phase: attacks land after every agent has decided
        for (source, intent) in damage {
            self.deal_damage(intent.target, intent.amount, Some(source));
        }

        // Motion phase: apply the emitted commands
        for (entity, command) in motions {
            if let Ok(mut pose) = self.world.get::<&mut Pose>(entity) {
                pose.position += command.velocity * dt;
                if command.facing.length_squared() > 1e-8 {
                    pose.facing = command.facing;
                }
            }
            if let Ok(mut stored) = self.world.get::<&mut MotionCommand>(entity) {
                *stored = command;
            }
        }
    }
}
