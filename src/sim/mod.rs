//! Deterministic simulation module
//!
//! All puddle and slip logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (slot order for puddles, id order for actors)
//! - No rendering or platform dependencies

pub mod animator;
pub mod collision;
pub mod controller;
pub mod hazard;
pub mod pool;
pub mod state;
pub mod tick;

pub use animator::{
    AnimatorState, FRAME_REGIONS, FrameDescriptor, FrameRegion, HazardReactionAnimator,
};
pub use collision::{CollisionOutcome, HazardCollisionTracker, TriggerReset};
pub use controller::{ActorHazardController, ControllerStep, Health};
pub use hazard::{Hazard, HazardArena, HazardId};
pub use pool::{HazardPoolState, PoolTransition, SpawnArea, WeatherHazardPool, WeatherSample};
pub use state::HazardWorld;
pub use tick::{TickInput, TickReport, tick};
