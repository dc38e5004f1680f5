//! Puddle Hazards - weather-driven puddles that trip actors up
//!
//! Core modules:
//! - `sim`: Deterministic simulation (puddle lifecycle, trigger tracking, fall reaction)
//! - `sync`: Trigger reports, authority validation and observer replay
//! - `settings`: Data-driven tuning loaded from JSON

pub mod settings;
pub mod sim;
pub mod sync;

pub use settings::Settings;

use serde::{Deserialize, Serialize};

/// Fixed engine constants (tuning that may vary lives in `Settings`)
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance from a puddle center at which an actor slips (inclusive)
    pub const FALL_ZONE_RADIUS: f32 = 12.0;

    /// Seconds each reaction frame is shown
    pub const FRAME_DURATION: f32 = 0.8;
    /// Number of frames in the fall reaction
    pub const FRAME_COUNT: usize = 5;
    /// Side length of one frame region in the reaction sheet
    pub const FRAME_REGION_SIZE: f32 = 64.0;
    /// Hard ceiling on a reaction sequence before it is forced to complete
    pub const ANIMATION_TIMEOUT: f32 = 5.0;

    /// Fraction of max health lost per slip
    pub const DAMAGE_FRACTION: f32 = 0.10;

    /// Arena capacity for simultaneously live puddles
    pub const MAX_POOL_SIZE: usize = 8;
}

/// Stable identifier for an actor (player or NPC) across the sync boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

