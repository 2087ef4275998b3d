//! Simulation configuration.
//!
//! Provides the run parameters of the headless simulation together with the
//! gameplay tunables. Configuration can be loaded from and saved to a TOML
//! file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use strider_common::ConfigError;
use strider_gameplay::{InteractionConfig, LocomotionConfig, NpcConfig};

/// Configuration file name.
const CONFIG_FILE: &str = "strider.toml";

/// Simulation configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Clock ===
    /// Fixed simulation step (s)
    pub fixed_dt: f32,
    /// Frames per second fed to the fixed-step clock
    pub frame_rate: u32,
    /// Simulated duration (s)
    pub duration: f32,
    /// Pace frames against the wall clock
    pub realtime: bool,

    // === Scenario ===
    /// Number of NPCs to spawn
    pub npc_count: u32,
    /// Radius of the ring NPCs are spawned on
    pub spawn_radius: f32,
    /// Base seed for NPC patrol RNGs (NPC `i` uses `seed + i`)
    pub seed: Option<u64>,

    // === Gameplay ===
    /// Player locomotion tunables
    pub player: LocomotionConfig,
    /// NPC tunables
    pub npc: NpcConfig,
    /// Interaction registry tunables
    pub interaction: InteractionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 0.02,
            frame_rate: 60,
            duration: 20.0,
            realtime: false,
            npc_count: 3,
            spawn_radius: 4.0,
            seed: Some(7),
            player: LocomotionConfig::default(),
            npc: NpcConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns the default config if the file is missing, unreadable, fails
    /// to parse, or carries gameplay tunables that do not validate.
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

        let config: Self = match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                return Self::default();
            },
        };

        if let Err(e) = config.clone().validate() {
            warn!("Rejected {}: {e}; using defaults", path.display());
            return Self::default();
        }

        info!(
            "Loaded scenario from {}: {} NPCs for {:.1}s (seed {:?})",
            path.display(),
            config.npc_count,
            config.duration,
            config.seed
        );
        config
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Default configuration file path (working directory).
    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Clamps clock values to sensible ranges and validates the gameplay
    /// tunables.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.fixed_dt = self.fixed_dt.clamp(0.001, 0.1);
        self.frame_rate = self.frame_rate.clamp(10, 240);
        self.duration = self.duration.clamp(0.0, 3600.0);
        self.npc_count = self.npc_count.min(64);
        self.spawn_radius = self.spawn_radius.max(0.0);

        self.player.validate()?;
        self.npc.validate()
    }

    /// Number of frames the run lasts.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        (f64::from(self.duration) * f64::from(self.frame_rate)).ceil() as u64
    }
}
