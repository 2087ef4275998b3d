//! Scripted headless run.
//!
//! Spawns a player and a ring of NPCs on a plane, replays a fixed input
//! script against the player and logs every agent event.

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use strider_common::AgentId;
use strider_gameplay::{
    AgentEvent, FocusCoordinator, LocomotionController, LookAtSink, MovementMode, Npc, NpcConfig,
    PatrolConfig, PlaneWorld, Simulation,
};

use crate::config::SimConfig;
use crate::timing::StepClock;

/// Half extent of the navigable demo area.
const NAV_HALF_EXTENT: f32 = 50.0;

/// One scripted player input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptAction {
    /// Hold a move input
    Move(Vec2),
    /// Press jump
    Jump,
    /// Stop all movement
    Stop,
    /// Switch movement backend
    Mode(MovementMode),
    /// Click the position of the nearest NPC
    ClickNearestNpc,
    /// Interact with whatever is highlighted
    Interact,
}

/// A script action and the simulated time it fires at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    /// Fire time (s)
    pub at: f32,
    /// Action
    pub action: ScriptAction,
}

/// Default demo script: walk, jump, turn, stop, then navigate to an NPC
/// and talk to it.
#[must_use]
pub fn default_script() -> Vec<ScriptStep> {
    [
        (0.0, ScriptAction::Move(Vec2::new(0.0, 1.0))),
        (1.0, ScriptAction::Jump),
        (2.5, ScriptAction::Move(Vec2::new(1.0, 0.0))),
        (4.0, ScriptAction::Stop),
        (4.5, ScriptAction::Mode(MovementMode::PointAndClick)),
        (5.0, ScriptAction::ClickNearestNpc),
        (9.0, ScriptAction::ClickNearestNpc),
        (12.0, ScriptAction::Interact),
        (12.5, ScriptAction::Interact),
        (16.0, ScriptAction::Mode(MovementMode::Keyboard)),
    ]
    .into_iter()
    .map(|(at, action)| ScriptStep { at, action })
    .collect()
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Fixed steps simulated
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Agent events observed
    pub events: usize,
    /// Jumps observed
    pub jumps: usize,
    /// Landings observed
    pub lands: usize,
    /// Final player position
    pub player_position: Vec3,
    /// NPC focused at the end
    pub focused: Option<AgentId>,
}

/// Logs look-at subject changes.
#[derive(Debug, Default)]
struct LoggedLookAt {
    last: Option<Vec3>,
}

impl LookAtSink for LoggedLookAt {
    fn look_at(&mut self, target: Option<Vec3>) {
        let changed = match (self.last, target) {
            (Some(a), Some(b)) => a.distance_squared(b) > 0.25,
            (a, b) => a.is_some() != b.is_some(),
        };
        if changed {
            debug!("Look-at subject: {target:?}");
            self.last = target;
        }
    }
}

/// Runs the default script.
pub fn run(config: &SimConfig) -> Result<RunSummary> {
    run_script(config, &default_script())
}

/// Runs `script` for `config.duration` simulated seconds.
pub fn run_script(config: &SimConfig, script: &[ScriptStep]) -> Result<RunSummary> {
    let world = PlaneWorld::flat(0.0).with_nav_extent(NAV_HALF_EXTENT);
    let coordinator = FocusCoordinator::new().with_sink(Box::new(LoggedLookAt::default()));
    let mut sim = Simulation::with_services(world, coordinator, config.interaction.clone());

    let player_id = sim
        .spawn_player(Vec3::ZERO, config.player.clone())
        .context("Failed to spawn player")?;

    let mut receivers: Vec<Receiver<AgentEvent>> = Vec::new();
    if let Some(player) = sim.player_mut() {
        receivers.push(player.subscribe());
    }

    for i in 0..config.npc_count {
        let angle = std::f32::consts::TAU * i as f32 / config.npc_count as f32;
        let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * config.spawn_radius;
        let npc_config = NpcConfig {
            patrol: PatrolConfig {
                seed: config.seed.map(|seed| seed.wrapping_add(u64::from(i))),
                ..config.npc.patrol.clone()
            },
            ..config.npc.clone()
        };
        let id = sim
            .spawn_npc(position, &npc_config)
            .with_context(|| format!("Failed to spawn NPC {i}"))?;
        if let Some(npc) = sim.npc_mut(id) {
            receivers.push(npc.controller_mut().subscribe());
        }
    }

    info!(
        "Running {:.1}s with player {player_id} and {} NPCs",
        config.duration,
        sim.npc_count()
    );

    let mut clock = StepClock::new(config.fixed_dt, config.frame_rate);
    let mut pending = script.iter().peekable();
    let mut summary = RunSummary {
        ticks: 0,
        elapsed: 0.0,
        events: 0,
        jumps: 0,
        lands: 0,
        player_position: Vec3::ZERO,
        focused: None,
    };

    for _ in 0..config.frame_count() {
        let steps = clock.accumulate(clock.frame_dt());
        for _ in 0..steps {
            let now = sim.elapsed() as f32;
            while let Some(step) = pending.next_if(|step| step.at <= now) {
                apply(&mut sim, step.action);
            }

            sim.tick(clock.fixed_dt());

            for receiver in &receivers {
                for event in receiver.try_iter() {
                    log_event(&event);
                    summary.events += 1;
                    match event {
                        AgentEvent::Jump { .. } => summary.jumps += 1,
                        AgentEvent::Land { .. } => summary.lands += 1,
                        AgentEvent::Focus { .. } | AgentEvent::ExitFocus { .. } => {},
                    }
                }
            }
        }
        if config.realtime {
            clock.pace();
        }
    }

    summary.ticks = sim.tick_count();
    summary.elapsed = sim.elapsed();
    summary.player_position = sim
        .player()
        .map_or(Vec3::ZERO, LocomotionController::position);
    summary.focused = sim.coordinator().focus_target();
    if clock.dropped_steps() > 0 {
        info!("Dropped {} steps", clock.dropped_steps());
    }
    Ok(summary)
}

fn apply(sim: &mut Simulation<PlaneWorld>, action: ScriptAction) {
    info!("Script: {action:?}");
    match action {
        ScriptAction::Interact => match sim.interact() {
            Some(npc) => info!("Interacted with {npc}"),
            None => info!("Nothing to interact with"),
        },
        ScriptAction::ClickNearestNpc => {
            let Some(origin) = sim.player().map(LocomotionController::position)
            else {
                return;
            };
            let nearest = sim
                .npcs()
                .map(Npc::position)
                .min_by(|a, b| a.distance(origin).total_cmp(&b.distance(origin)));
            if let (Some(target), Some(player)) = (nearest, sim.player_mut()) {
                player.set_target_position(target);
            }
        },
        ScriptAction::Move(input) => {
            if let Some(player) = sim.player_mut() {
                player.set_move_input(input);
            }
        },
        ScriptAction::Jump => {
            if let Some(player) = sim.player_mut() {
                player.set_jump_input(true);
            }
        },
        ScriptAction::Stop => {
            if let Some(player) = sim.player_mut() {
                player.stop_movement();
            }
        },
        ScriptAction::Mode(mode) => {
            if let Some(player) = sim.player_mut() {
                player.set_movement_mode(mode);
            }
        },
    }
}

fn log_event(event: &AgentEvent) {
    match event {
        AgentEvent::Jump { agent } => info!("{agent} jumped"),
        AgentEvent::Land { agent } => info!("{agent} landed"),
        AgentEvent::Focus { agent } => info!("{agent} focused"),
        AgentEvent::ExitFocus { agent } => info!("{agent} left focus"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> SimConfig {
        SimConfig {
            duration: 6.0,
            npc_count: 2,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_default_script_is_ordered() {
        let script = default_script();
        assert!(script.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_run_jumps_and_lands_once() {
        let summary = run(&short_config()).expect("run succeeds");
        assert_eq!(summary.jumps, 1);
        assert_eq!(summary.lands, 1);
        assert!(summary.ticks >= 295);
        assert!((summary.elapsed - 6.0).abs() < 0.1);
    }

    #[test]
    fn test_interact_near_npc_focuses_it() {
        let config = SimConfig {
            duration: 1.0,
            npc_count: 1,
            spawn_radius: 1.0,
            ..SimConfig::default()
        };
        let script = [ScriptStep {
            at: 0.1,
            action: ScriptAction::Interact,
        }];
        let summary = run_script(&config, &script).expect("run succeeds");
        assert!(summary.focused.is_some());
        assert_eq!(summary.events, 1);
    }

    #[test]
    fn test_no_npcs_runs_cleanly() {
        let config = SimConfig {
            duration: 0.5,
            npc_count: 0,
            ..SimConfig::default()
        };
        let summary = run_script(&config, &[]).expect("run succeeds");
        assert_eq!(summary.events, 0);
        assert_eq!(summary.focused, None);
        assert_eq!(summary.player_position, Vec3::ZERO);
    }
}
