//! Boundary errors. None of these are fatal: the event is dropped and the
//! simulation carries on.

use thiserror::Error;

use crate::sim::hazard::HazardId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to decode sync message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown or retired puddle {0}")]
    UnknownHazard(HazardId),

    #[error("reported position is {distance:.1} from {hazard}, too far to have slipped")]
    ImplausiblePosition { hazard: HazardId, distance: f32 },

    #[error("sync channel closed")]
    ChannelClosed,
}
