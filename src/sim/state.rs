//! World state for one process
//!
//! Local actors are fully simulated. Remote actors only exist as reaction
//! animators driven by authority broadcasts.

use std::collections::BTreeMap;

use glam::Vec2;

use super::animator::{FrameDescriptor, HazardReactionAnimator};
use super::controller::ActorHazardController;
use super::hazard::HazardId;
use super::pool::WeatherHazardPool;
use crate::ActorId;
use crate::settings::Settings;
use crate::sync::{HazardSyncRelay, OfflineRelay, Rx};

/// Everything one process simulates: the puddles, its own actors, and
/// animation-only mirrors of actors controlled elsewhere
pub struct HazardWorld {
    pub(super) pool: WeatherHazardPool,
    pub(super) actors: Vec<ActorHazardController>,
    /// Animation-only mirrors of actors simulated elsewhere
    pub(super) remotes: BTreeMap<ActorId, HazardReactionAnimator>,
    pub(super) relay: Box<dyn HazardSyncRelay>,
    pub(super) inbox: Option<Rx>,
    max_health: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl HazardWorld {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pool: WeatherHazardPool::new(settings),
            actors: Vec::new(),
            remotes: BTreeMap::new(),
            relay: Box::new(OfflineRelay),
            inbox: None,
            max_health: settings.max_health,
            time_ticks: 0,
        }
    }

    /// Report local slips through `relay`
    pub fn with_relay(mut self, relay: Box<dyn HazardSyncRelay>) -> Self {
        self.relay = relay;
        self
    }

    /// Receive authority broadcasts from `inbox`
    pub fn with_inbox(mut self, inbox: Rx) -> Self {
        self.inbox = Some(inbox);
        self
    }

    /// Add a locally controlled actor at full health. Ids already in use
    /// are ignored.
    pub fn spawn_actor(&mut self, actor_id: ActorId, position: Vec2) {
        if self.actor(actor_id).is_some() {
            log::warn!("{} already spawned", actor_id);
            return;
        }
        self.remotes.remove(&actor_id);
        self.actors
            .push(ActorHazardController::new(actor_id, position, self.max_health));
        self.actors.sort_by_key(|a| a.actor_id());
    }

    /// Add a locally controlled actor with a prepared controller, replacing
    /// any actor (or remote mirror) with the same id
    pub fn insert_actor(&mut self, controller: ActorHazardController) {
        let actor_id = controller.actor_id();
        self.actors.retain(|a| a.actor_id() != actor_id);
        self.remotes.remove(&actor_id);
        self.actors.push(controller);
        self.actors.sort_by_key(|a| a.actor_id());
    }

    /// Replay a slip reported by the authority: animation only, no
    /// collision and no damage. Returns whether a replay started.
    pub fn on_remote_hazard_trigger(&mut self, actor_id: ActorId, hazard_id: HazardId) -> bool {
        if self.actor(actor_id).is_some() {
            log::debug!("Ignoring echo of local {} on {}", actor_id, hazard_id);
            return false;
        }
        let started = self.remotes.entry(actor_id).or_default().start();
        if started {
            log::debug!("Replaying slip of {} on {}", actor_id, hazard_id);
        }
        started
    }

    pub fn pool(&self) -> &WeatherHazardPool {
        &self.pool
    }

    pub fn actors(&self) -> &[ActorHazardController] {
        &self.actors
    }

    pub fn actor(&self, actor_id: ActorId) -> Option<&ActorHazardController> {
        self.actors.iter().find(|a| a.actor_id() == actor_id)
    }

    /// Frame to draw for a remote actor, `None` when it is upright
    pub fn remote_frame(&self, actor_id: ActorId) -> Option<FrameDescriptor> {
        self.remotes
            .get(&actor_id)
            .and_then(HazardReactionAnimator::current_frame_descriptor)
    }

    pub fn is_remote_reacting(&self, actor_id: ActorId) -> bool {
        self.remotes
            .get(&actor_id)
            .is_some_and(HazardReactionAnimator::is_active)
    }
}
