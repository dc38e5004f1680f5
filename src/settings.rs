//! Tunable settings
//!
//! Persisted as JSON next to the binary (or wherever the caller points).
//! The fixed engine constants in `crate::consts` are not part of this.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::pool::SpawnArea;

/// Smallest puddle side the spawner will produce
const MIN_PUDDLE_SIDE: f32 = 1.0;

/// The visible play area puddles may spawn in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleArea {
    pub width: f32,
    pub height: f32,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for puddle placement
    pub seed: u64,

    // === Puddle lifecycle ===
    /// Seconds of continuous rain before puddles form
    pub accumulation_threshold: f32,
    /// Seconds after the rain stops before puddles are gone
    pub evaporation_duration: f32,

    // === Spawning ===
    pub visible_area: VisibleArea,
    /// Smallest puddle (width, height)
    pub min_puddle_extents: Vec2,
    /// Largest puddle (width, height)
    pub max_puddle_extents: Vec2,

    // === Actors ===
    /// Max health given to newly created actors
    pub max_health: f32,

    // === Authority ===
    /// Extra distance beyond the fall zone the authority tolerates when
    /// checking a reported position (covers latency)
    pub plausibility_slack: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,

            accumulation_threshold: 5.0,
            evaporation_duration: 8.0,

            visible_area: VisibleArea {
                width: 480.0,
                height: 270.0,
            },
            min_puddle_extents: Vec2::new(16.0, 8.0),
            max_puddle_extents: Vec2::new(40.0, 20.0),

            max_health: 100.0,

            plausibility_slack: 4.0,
        }
    }
}

impl Settings {
    /// Spawn bounds with extents sanitized to be strictly positive and ordered
    pub fn spawn_area(&self) -> SpawnArea {
        let min_extents = self.min_puddle_extents.max(Vec2::splat(MIN_PUDDLE_SIDE));
        let max_extents = self.max_puddle_extents.max(min_extents);
        SpawnArea {
            width: self.visible_area.width.max(0.0),
            height: self.visible_area.height.max(0.0),
            min_extents,
            max_extents,
        }
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings at {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
