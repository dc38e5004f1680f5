//! Per-actor slip orchestration
//!
//! One call per tick. While the fall reaction plays the actor is frozen:
//! movement requests are ignored and no puddle is checked, not even a
//! different one, until the animation has run to completion.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::animator::HazardReactionAnimator;
use super::collision::{HazardCollisionTracker, TriggerReset};
use super::hazard::Hazard;
use crate::ActorId;
use crate::consts::DAMAGE_FRACTION;
use crate::sync::{HazardSyncRelay, HazardTriggerEvent};

/// Actor health, never below zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Lose `fraction` of max health, clamped at zero
    pub fn apply_fraction(&mut self, fraction: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - fraction * self.max).max(0.0);
        before - self.current
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// What a controller tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStep {
    /// Free to move, nothing tripped
    Idle,
    /// Slipped this tick
    Triggered(HazardTriggerEvent),
    /// Fall reaction playing, actor frozen
    Reacting,
    /// Reaction finished this tick, control restored
    Recovered,
}

/// Owns one actor's tracker and animator
#[derive(Debug, Clone)]
pub struct ActorHazardController {
    actor_id: ActorId,
    position: Vec2,
    health: Health,
    frozen: bool,
    tracker: HazardCollisionTracker,
    animator: HazardReactionAnimator,
}

impl ActorHazardController {
    pub fn new(actor_id: ActorId, position: Vec2, max_health: f32) -> Self {
        Self {
            actor_id,
            position,
            health: Health::full(max_health),
            frozen: false,
            tracker: HazardCollisionTracker::new(),
            animator: HazardReactionAnimator::new(),
        }
    }

    /// Override current health (clamped to `[0, max]`)
    pub fn with_health(mut self, current: f32) -> Self {
        self.health.current = current.clamp(0.0, self.health.max);
        self
    }

    /// Advance one tick. `requested` is where the movement collaborator
    /// wants the actor; it is ignored while frozen.
    pub fn tick(
        &mut self,
        requested: Vec2,
        hazards: &[Hazard],
        dt: f32,
        relay: &mut dyn HazardSyncRelay,
    ) -> ControllerStep {
        if self.animator.is_active() {
            self.animator.tick(dt);
            if !self.animator.is_complete() {
                return ControllerStep::Reacting;
            }
        }
        if self.animator.is_complete() {
            self.recover(hazards);
            return ControllerStep::Recovered;
        }

        if requested.is_finite() {
            self.position = requested;
        } else {
            log::warn!("{} ignoring non-finite move to {:?}", self.actor_id, requested);
        }

        let outcome = self
            .tracker
            .check_collision(self.position.x, self.position.y, hazards);
        match outcome.hazard {
            Some(hazard) if outcome.hit => self.trigger(hazard, relay),
            _ => {
                self.tracker
                    .update_triggered_states(self.position.x, self.position.y, hazards);
                ControllerStep::Idle
            }
        }
    }

    fn trigger(&mut self, hazard: Hazard, relay: &mut dyn HazardSyncRelay) -> ControllerStep {
        self.tracker.mark_triggered(&hazard);
        let lost = self.health.apply_fraction(DAMAGE_FRACTION);
        self.animator.start();
        self.frozen = true;

        let event = HazardTriggerEvent {
            actor_id: self.actor_id,
            hazard_id: hazard.id,
        };
        log::info!(
            "{} slipped on {} (-{:.1} hp, {:.1}/{:.1} left)",
            self.actor_id,
            hazard.id,
            lost,
            self.health.current,
            self.health.max
        );
        relay.emit(event, self.position);
        ControllerStep::Triggered(event)
    }

    fn recover(&mut self, hazards: &[Hazard]) {
        self.frozen = false;
        self.animator.reset();
        self.tracker
            .update_triggered_states(self.position.x, self.position.y, hazards);
        log::debug!("{} back on their feet", self.actor_id);
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn animator(&self) -> &HazardReactionAnimator {
        &self.animator
    }

    pub fn tracker(&self) -> &HazardCollisionTracker {
        &self.tracker
    }
}

impl TriggerReset for ActorHazardController {
    fn clear_all_triggered_states(&mut self) {
        self.tracker.clear_all_triggered_states();
    }
}

/// Every local actor's trigger state is wiped together
impl TriggerReset for Vec<ActorHazardController> {
    fn clear_all_triggered_states(&mut self) {
        for controller in self.iter_mut() {
            controller.clear_all_triggered_states();
        }
    }
}
