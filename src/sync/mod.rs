//! Trigger propagation across the client/authority boundary
//!
//! A client that sees its own actor slip sends a `Report`. The authority
//! checks the puddle is still live and the reported position is believable,
//! then sends a `Broadcast` to every other observer. Observers replay the
//! fall animation only: no collision, no damage.

pub mod authority;
pub mod channel;
pub mod error;
pub mod message;

pub use authority::{Authority, RelayReport};
pub use channel::{ChannelRelay, Rx, Tx, channel};
pub use error::SyncError;
pub use message::{HazardTriggerEvent, SyncMessage};

use glam::Vec2;

/// Outbound side of the boundary, called by the core on a local trigger
pub trait HazardSyncRelay {
    /// `position` is where the actor stood when it slipped
    fn emit(&mut self, event: HazardTriggerEvent, position: Vec2);
}

/// Local-only play: keep the events for inspection
impl HazardSyncRelay for Vec<HazardTriggerEvent> {
    fn emit(&mut self, event: HazardTriggerEvent, _position: Vec2) {
        self.push(event);
    }
}

/// Relay used when nobody is listening
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRelay;

impl HazardSyncRelay for OfflineRelay {
    fn emit(&mut self, event: HazardTriggerEvent, _position: Vec2) {
        log::debug!("Offline, not reporting {} on {}", event.actor_id, event.hazard_id);
    }
}

