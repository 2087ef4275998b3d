//! Fixed-order tick scheduler over every agent in a world.
//!
//! One [`Simulation::tick`] runs, in order: the physics pass for all agents,
//! the frame pass, focus arbitration and the interaction highlight update.

use ahash::AHashMap;
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info};

use strider_common::{AgentId, ConfigError, InteractableId};

use crate::config::{InteractionConfig, LocomotionConfig, NpcConfig};
use crate::focus::{FocusCoordinator, FocusOutcome};
use crate::interaction::{Interactable, InteractionRegistry};
use crate::locomotion::LocomotionController;
use crate::npc::Npc;
use crate::world::World;

/// Errors from simulation setup calls.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// No agent with this id
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The agent is already registered
    #[error("agent already registered: {0}")]
    AlreadyRegistered(AgentId),

    /// The agent was never registered
    #[error("agent not registered: {0}")]
    NotRegistered(AgentId),

    /// A player has already been spawned
    #[error("player already spawned: {0}")]
    PlayerExists(AgentId),

    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for simulation setup calls.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Owns the world, the agents and the shared services.
#[derive(Debug)]
pub struct Simulation<W: World> {
    world: W,
    player: Option<LocomotionController>,
    npcs: AHashMap<AgentId, Npc>,
    coordinator: FocusCoordinator,
    interactions: InteractionRegistry,
    interaction_config: InteractionConfig,
    tick: u64,
    elapsed: f64,
}

impl<W: World> Simulation<W> {
    /// Creates an empty simulation over `world`.
    #[must_use]
    pub fn new(world: W) -> Self {
        Self::with_services(world, FocusCoordinator::new(), InteractionConfig::default())
    }

    /// Creates a simulation with an explicitly built coordinator.
    #[must_use]
    pub fn with_services(
        world: W,
        coordinator: FocusCoordinator,
        interaction_config: InteractionConfig,
    ) -> Self {
        Self {
            world,
            player: None,
            npcs: AHashMap::new(),
            coordinator,
            interactions: InteractionRegistry::new(),
            interaction_config,
            tick: 0,
            elapsed: 0.0,
        }
    }

    /// Spawns the player.
    pub fn spawn_player(
        &mut self,
        position: Vec3,
        config: LocomotionConfig,
    ) -> SimulationResult<AgentId> {
        if let Some(player) = &self.player {
            return Err(SimulationError::PlayerExists(player.id()));
        }
        config.validate()?;
        let player = LocomotionController::player(position, config);
        let id = player.id();
        self.player = Some(player);
        info!("Spawned player {id} at {position:?}");
        Ok(id)
    }

    /// Spawns an NPC and registers it for focus and interaction.
    pub fn spawn_npc(&mut self, position: Vec3, config: &NpcConfig) -> SimulationResult<AgentId> {
        config.validate()?;
        self.insert_npc(Npc::new(position, config))
    }

    /// Adds an already built NPC.
    pub fn insert_npc(&mut self, npc: Npc) -> SimulationResult<AgentId> {
        let id = npc.id();
        self.coordinator.register(id)?;
        self.interactions.register(
            Interactable::new(npc.position(), self.interaction_config.npc_range).owned_by(id),
        );
        info!("Spawned NPC {id} at {:?}", npc.position());
        self.npcs.insert(id, npc);
        Ok(id)
    }

    /// Removes an NPC from every registry.
    pub fn despawn_npc(&mut self, id: AgentId) -> SimulationResult<Npc> {
        let npc = self
            .npcs
            .remove(&id)
            .ok_or(SimulationError::UnknownAgent(id))?;
        self.coordinator.unregister(id)?;
        if let Some(interactable) = self.interactions.owned_by(id) {
            self.interactions.unregister(interactable);
        }
        info!("Despawned NPC {id}");
        Ok(npc)
    }

    /// Advances every agent by `dt`.
    pub fn tick(&mut self, dt: f32) {
        // Physics pass commits poses before anything reads them
        if let Some(player) = self.player.as_mut() {
            player.physics_step(&self.world, dt);
        }
        for id in self.coordinator.registered() {
            if let Some(npc) = self.npcs.get_mut(id) {
                npc.physics_step(&self.world, dt);
            }
        }

        // Frame pass
        if let Some(player) = self.player.as_mut() {
            player.frame_step(dt);
        }
        let subject = self.player.as_ref().map(LocomotionController::position);
        for id in self.coordinator.registered() {
            if let Some(npc) = self.npcs.get_mut(id) {
                npc.frame_step(&self.world, subject, dt);
            }
        }

        self.coordinator.arbitrate(&mut self.npcs, &self.world, subject);

        for npc in self.npcs.values() {
            if let Some(interactable) = self.interactions.owned_by(npc.id()) {
                self.interactions.set_position(interactable, npc.position());
            }
        }
        if let Some(subject) = subject {
            self.interactions.update(subject);
        }

        self.tick += 1;
        self.elapsed += f64::from(dt);
    }

    /// Sends a focus trigger to an NPC.
    pub fn trigger_focus(&mut self, id: AgentId) -> SimulationResult<FocusOutcome> {
        let npc = self
            .npcs
            .get_mut(&id)
            .ok_or(SimulationError::UnknownAgent(id))?;
        Ok(npc.trigger_focus(&self.world))
    }

    /// Interacts with the highlighted interactable. An NPC interactable
    /// triggers focus on that NPC; its id is returned.
    pub fn interact(&mut self) -> Option<AgentId> {
        let target = self.interactions.interact()?;
        let (interactable, owner) = (target.id, target.owner);
        let Some(agent) = owner else {
            debug!("Interacted with {interactable:?}");
            return None;
        };
        self.trigger_focus(agent).ok().map(|_| agent)
    }

    /// The world capabilities.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// The player, if spawned.
    #[must_use]
    pub fn player(&self) -> Option<&LocomotionController> {
        self.player.as_ref()
    }

    /// Mutable player access for intents.
    pub fn player_mut(&mut self) -> Option<&mut LocomotionController> {
        self.player.as_mut()
    }

    /// Looks up an NPC.
    #[must_use]
    pub fn npc(&self, id: AgentId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    /// Mutable NPC access.
    pub fn npc_mut(&mut self, id: AgentId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    /// NPCs in registration order.
    pub fn npcs(&self) -> impl Iterator<Item = &Npc> + '_ {
        self.coordinator
            .registered()
            .iter()
            .filter_map(|id| self.npcs.get(id))
    }

    /// NPC count.
    #[must_use]
    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    /// The focus coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &FocusCoordinator {
        &self.coordinator
    }

    /// The interaction registry.
    #[must_use]
    pub fn interactions(&self) -> &InteractionRegistry {
        &self.interactions
    }

    /// Currently highlighted interactable.
    #[must_use]
    pub fn highlighted(&self) -> Option<InteractableId> {
        self.interactions.highlighted()
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
