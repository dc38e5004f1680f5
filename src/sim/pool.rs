//! Rain-driven puddle lifecycle
//!
//! NONE -> ACCUMULATING -> ACTIVE -> EVAPORATING -> NONE, driven by the
//! weather collaborator's precipitation signal. Every path back into NONE
//! wipes trigger state so the next shower starts from a clean slate.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::TriggerReset;
use super::hazard::{Hazard, HazardArena, HazardId};
use crate::consts::MAX_POOL_SIZE;
use crate::settings::Settings;

/// Lifecycle phase of the puddle pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardPoolState {
    /// Dry ground
    #[default]
    None,
    /// Raining, puddles not formed yet
    Accumulating,
    /// Puddles on the ground, still raining
    Active,
    /// Rain stopped, puddles drying out
    Evaporating,
}

/// Per-tick reading from the weather collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub precipitation_active: bool,
    /// Rain intensity, clamped to [0, 1] when read
    pub intensity: f32,
}

impl WeatherSample {
    pub fn raining(intensity: f32) -> Self {
        Self {
            precipitation_active: true,
            intensity,
        }
    }

    pub fn dry() -> Self {
        Self::default()
    }

    fn clamped_intensity(&self) -> f32 {
        if self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A lifecycle change reported by `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolTransition {
    pub from: HazardPoolState,
    pub to: HazardPoolState,
}

/// Where and how large freshly spawned puddles may be
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub width: f32,
    pub height: f32,
    pub min_extents: Vec2,
    pub max_extents: Vec2,
}

/// Owner of every puddle and its lifecycle
#[derive(Debug, Clone)]
pub struct WeatherHazardPool {
    state: HazardPoolState,
    accumulation_timer: f32,
    evaporation_timer: f32,
    accumulation_threshold: f32,
    evaporation_duration: f32,
    area: SpawnArea,
    arena: HazardArena,
    rng: Pcg32,
}

impl WeatherHazardPool {
    pub fn new(settings: &Settings) -> Self {
        let defaults = Settings::default();
        Self {
            state: HazardPoolState::None,
            accumulation_timer: 0.0,
            evaporation_timer: 0.0,
            accumulation_threshold: lifecycle_duration(
                "accumulation_threshold",
                settings.accumulation_threshold,
                defaults.accumulation_threshold,
            ),
            evaporation_duration: lifecycle_duration(
                "evaporation_duration",
                settings.evaporation_duration,
                defaults.evaporation_duration,
            ),
            area: settings.spawn_area(),
            arena: HazardArena::new(),
            rng: Pcg32::seed_from_u64(settings.seed),
        }
    }

    /// Advance the lifecycle by `dt`. `triggers` is wiped on every entry
    /// into NONE.
    pub fn update(
        &mut self,
        weather: WeatherSample,
        dt: f32,
        triggers: &mut dyn TriggerReset,
    ) -> Option<PoolTransition> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let from = self.state;

        match self.state {
            HazardPoolState::None => {
                if weather.precipitation_active && self.arena.is_empty() {
                    self.accumulation_timer = 0.0;
                    self.state = HazardPoolState::Accumulating;
                }
            }
            HazardPoolState::Accumulating => {
                if !weather.precipitation_active {
                    // Rain stopped early: nothing was spawned, but clean up anyway
                    self.accumulation_timer = 0.0;
                    self.state = HazardPoolState::None;
                    triggers.clear_all_triggered_states();
                } else {
                    self.accumulation_timer += dt;
                    if self.accumulation_timer >= self.accumulation_threshold {
                        let count = self.spawn_count(weather.clamped_intensity());
                        self.spawn_batch(count);
                        self.state = HazardPoolState::Active;
                    }
                }
            }
            HazardPoolState::Active => {
                if !weather.precipitation_active {
                    self.evaporation_timer = 0.0;
                    self.state = HazardPoolState::Evaporating;
                }
            }
            HazardPoolState::Evaporating => {
                if weather.precipitation_active {
                    self.evaporation_timer = 0.0;
                    self.state = HazardPoolState::Active;
                } else {
                    self.evaporation_timer += dt;
                    if self.evaporation_timer >= self.evaporation_duration {
                        let retired = self.arena.clear();
                        log::debug!("Evaporated {} puddles", retired);
                        self.evaporation_timer = 0.0;
                        self.accumulation_timer = 0.0;
                        self.state = HazardPoolState::None;
                        triggers.clear_all_triggered_states();
                    }
                }
            }
        }

        (from != self.state).then(|| {
            log::info!("Puddle pool {:?} -> {:?} ({} live)", from, self.state, self.arena.len());
            PoolTransition {
                from,
                to: self.state,
            }
        })
    }

    /// How many puddles a shower of this intensity leaves behind
    fn spawn_count(&mut self, intensity: f32) -> usize {
        let base = (intensity * MAX_POOL_SIZE as f32).ceil() as usize;
        let jitter = self.rng.random_range(0..=1usize);
        base.saturating_sub(jitter).clamp(1, MAX_POOL_SIZE)
    }

    /// Spawn up to `count` puddles at random spots in the visible area.
    /// Requests beyond the free capacity are clamped. Returns the new ids.
    pub fn spawn_batch(&mut self, count: usize) -> Vec<HazardId> {
        let free = MAX_POOL_SIZE - self.arena.len();
        if count > free {
            log::debug!("Spawn request for {} puddles clamped to {}", count, free);
        }
        let count = count.min(free);

        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let extents = Vec2::new(
                self.random_between(self.area.min_extents.x, self.area.max_extents.x),
                self.random_between(self.area.min_extents.y, self.area.max_extents.y),
            );
            let position = Vec2::new(
                self.random_between(0.0, (self.area.width - extents.x).max(0.0)),
                self.random_between(0.0, (self.area.height - extents.y).max(0.0)),
            );
            let rotation = self.random_between(0.0, std::f32::consts::TAU);
            if let Some(id) = self.arena.insert(position, extents, rotation) {
                spawned.push(id);
            }
        }
        spawned
    }

    fn random_between(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }

    /// Puddles live this tick. Holding the slice borrows the pool, so it
    /// cannot change underneath a reader.
    pub fn get_active_hazards(&self) -> &[Hazard] {
        self.arena.as_slice()
    }

    /// Resolve a live puddle id
    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.arena.get(id)
    }

    pub fn state(&self) -> HazardPoolState {
        self.state
    }

    pub fn accumulation_timer(&self) -> f32 {
        self.accumulation_timer
    }

    pub fn evaporation_timer(&self) -> f32 {
        self.evaporation_timer
    }

    /// 0 while wet, rising to 1 as the puddles finish drying
    pub fn evaporation_progress(&self) -> f32 {
        match self.state {
            HazardPoolState::Evaporating if self.evaporation_duration > 0.0 => {
                (self.evaporation_timer / self.evaporation_duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// A lifecycle duration must be finite and non-negative, otherwise the
/// pool could never leave (or never stay in) a state
fn lifecycle_duration(name: &str, value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("Invalid {} {}, using {}", name, value, fallback);
        fallback
    }
}
