//! Typed messages crossing the sync boundary, with a JSON wire codec

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::error::SyncError;
use crate::ActorId;
use crate::sim::hazard::HazardId;

/// "This actor slipped on this puddle"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HazardTriggerEvent {
    pub actor_id: ActorId,
    pub hazard_id: HazardId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Client -> authority: a local actor slipped at `position`
    Report {
        event: HazardTriggerEvent,
        position: Vec2,
    },
    /// Authority -> observers: a validated slip, forwarded unchanged
    Broadcast { event: HazardTriggerEvent },
}

impl SyncMessage {
    pub fn event(&self) -> HazardTriggerEvent {
        match self {
            SyncMessage::Report { event, .. } | SyncMessage::Broadcast { event } => *event,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
