//! Engine settings and tuning
//!
//! Loaded from JSON by the host; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Difficulty ===
    /// Frames between obstacle spawns at the start of a run
    pub initial_spawn_interval: u32,
    /// Spawn interval never ramps below this
    pub min_spawn_interval: u32,
    /// The spawn interval shrinks by one every this many frames
    pub difficulty_step_frames: u32,

    // === Round setup ===
    /// Chickens placed at the start of every run
    pub initial_targets: usize,

    // === Pools (initial capacity hints, pools still grow) ===
    pub obstacle_pool_capacity: usize,
    pub debris_pool_capacity: usize,
    pub target_pool_capacity: usize,

    // === Misc ===
    /// RNG seed; `None` picks one from the clock
    pub seed: Option<u64>,
    /// Background clear color (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_spawn_interval: 64,
            min_spawn_interval: 15,
            difficulty_step_frames: 100,

            initial_targets: 5,

            obstacle_pool_capacity: 100,
            debris_pool_capacity: 100,
            target_pool_capacity: 5,

            seed: None,
            clear_color: [0.090_19, 0.105_88, 0.133_33, 0.0],
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp values that would break the frame loop (zero intervals, inverted floors)
    pub fn validated(mut self) -> Self {
        if self.min_spawn_interval == 0 {
            log::warn!("min_spawn_interval of 0 clamped to 1");
            self.min_spawn_interval = 1;
        }
        if self.initial_spawn_interval < self.min_spawn_interval {
            log::warn!(
                "initial_spawn_interval {} below floor {}, raised",
                self.initial_spawn_interval,
                self.min_spawn_interval
            );
            self.initial_spawn_interval = self.min_spawn_interval;
        }
        if self.difficulty_step_frames == 0 {
            self.difficulty_step_frames = 1;
        }
        self
    }

    /// Seed to use for this run
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}
