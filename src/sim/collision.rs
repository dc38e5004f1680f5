//! Puddle trigger detection for a single actor
//!
//! The tricky part is not the geometry (a circle test against the puddle
//! center) but the bookkeeping: once a puddle has tripped an actor it must
//! stay silent until the actor has walked clear of it, otherwise a standing
//! actor would be re-damaged every tick.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::hazard::{Hazard, HazardId};
use crate::consts::FALL_ZONE_RADIUS;

/// Result of a trigger query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionOutcome {
    /// Whether an untriggered puddle is within the fall zone
    pub hit: bool,
    /// The puddle that was hit (if any)
    pub hazard: Option<Hazard>,
}

impl CollisionOutcome {
    pub fn miss() -> Self {
        Self {
            hit: false,
            hazard: None,
        }
    }

    fn with(hazard: Hazard) -> Self {
        Self {
            hit: true,
            hazard: Some(hazard),
        }
    }
}

/// Anything holding trigger state that the puddle lifecycle must wipe
pub trait TriggerReset {
    fn clear_all_triggered_states(&mut self);
}

/// Per-actor triggered set plus in-zone map for edge resets
#[derive(Debug, Clone, Default)]
pub struct HazardCollisionTracker {
    triggered: BTreeSet<HazardId>,
    in_zone: BTreeMap<HazardId, bool>,
}

impl HazardCollisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the first untriggered puddle whose center is within
    /// `FALL_ZONE_RADIUS` of the actor (boundary inclusive).
    ///
    /// Iteration order wins ties: the first qualifying puddle in `hazards`
    /// is returned even if a later one is closer.
    pub fn check_collision(
        &self,
        actor_x: f32,
        actor_y: f32,
        hazards: &[Hazard],
    ) -> CollisionOutcome {
        let actor = Vec2::new(actor_x, actor_y);
        if !actor.is_finite() {
            log::warn!("Ignoring trigger check at non-finite position {:?}", actor);
            return CollisionOutcome::miss();
        }

        hazards
            .iter()
            .filter(|h| h.active && !self.triggered.contains(&h.id))
            .find(|h| h.distance_to(actor) <= FALL_ZONE_RADIUS)
            .map_or_else(CollisionOutcome::miss, |h| CollisionOutcome::with(*h))
    }

    /// Mark a puddle as having tripped this actor (idempotent)
    pub fn mark_triggered(&mut self, hazard: &Hazard) {
        if self.triggered.insert(hazard.id) {
            log::debug!("{} marked triggered", hazard.id);
        }
        self.in_zone.insert(hazard.id, true);
    }

    /// Edge-reset bookkeeping: any triggered puddle the actor is now clear of
    /// becomes eligible again. Ids missing from `hazards` have been retired
    /// by the pool and are dropped.
    ///
    /// Must not be called while the actor's reaction animation is running.
    pub fn update_triggered_states(&mut self, actor_x: f32, actor_y: f32, hazards: &[Hazard]) {
        let actor = Vec2::new(actor_x, actor_y);
        if !actor.is_finite() {
            log::warn!("Skipping edge reset at non-finite position {:?}", actor);
            return;
        }

        self.triggered.retain(|id| hazards.iter().any(|h| h.id == *id));
        self.in_zone.retain(|id, _| hazards.iter().any(|h| h.id == *id));

        for hazard in hazards {
            let inside = hazard.distance_to(actor) <= FALL_ZONE_RADIUS;
            self.in_zone.insert(hazard.id, inside);
            if !inside && self.triggered.remove(&hazard.id) {
                log::debug!("{} edge-reset (actor left the fall zone)", hazard.id);
            }
        }
    }

    /// Forget every trigger and zone flag
    pub fn clear_all_triggered_states(&mut self) {
        self.triggered.clear();
        self.in_zone.clear();
    }

    pub fn is_triggered(&self, id: HazardId) -> bool {
        self.triggered.contains(&id)
    }

    pub fn triggered_count(&self) -> usize {
        self.triggered.len()
    }

    /// Whether the last bookkeeping pass saw the actor inside this puddle's zone
    pub fn is_in_zone(&self, id: HazardId) -> bool {
        self.in_zone.get(&id).copied().unwrap_or(false)
    }
}

impl TriggerReset for HazardCollisionTracker {
    fn clear_all_triggered_states(&mut self) {
        HazardCollisionTracker::clear_all_triggered_states(self);
    }
}
