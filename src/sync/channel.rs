//! In-process command channel for sync messages.
//!
//! Thin wrapper over `std::sync::mpsc` with non-blocking drain helpers, so
//! a tick never waits on the other side of the boundary.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec2;

use super::HazardSyncRelay;
use super::error::SyncError;
use super::message::{HazardTriggerEvent, SyncMessage};

#[derive(Debug, Clone)]
pub struct Tx(Sender<SyncMessage>);

#[derive(Debug)]
pub struct Rx(Receiver<SyncMessage>);

/// Create a sender/receiver pair. The underlying channel is unbounded.
#[must_use]
pub fn channel() -> (Tx, Rx) {
    let (s, r) = mpsc::channel();
    (Tx(s), Rx(r))
}

impl Tx {
    pub fn send(&self, msg: SyncMessage) -> Result<(), SyncError> {
        self.0.send(msg).map_err(|_| SyncError::ChannelClosed)
    }
}

impl Rx {
    /// Non-blocking receive of a single message
    #[must_use]
    pub fn try_recv(&self) -> Option<SyncMessage> {
        self.0.try_recv().ok()
    }

    /// Drain all currently queued messages
    #[must_use]
    pub fn drain(&self) -> Vec<SyncMessage> {
        self.0.try_iter().collect()
    }
}

/// Client-side relay: every local slip becomes a `Report` to the authority
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    tx: Tx,
}

impl ChannelRelay {
    pub fn new(tx: Tx) -> Self {
        Self { tx }
    }
}

impl HazardSyncRelay for ChannelRelay {
    fn emit(&mut self, event: HazardTriggerEvent, position: Vec2) {
        if let Err(e) = self.tx.send(SyncMessage::Report { event, position }) {
            log::warn!("Dropping report for {} on {}: {}", event.actor_id, event.hazard_id, e);
        }
    }
}
