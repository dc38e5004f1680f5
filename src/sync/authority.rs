//! Reference authority: validates slip reports and fans them out

use std::collections::BTreeMap;

use glam::Vec2;

use super::channel::{Rx, Tx, channel};
use super::error::SyncError;
use super::message::{HazardTriggerEvent, SyncMessage};
use crate::ActorId;
use crate::consts::FALL_ZONE_RADIUS;
use crate::settings::Settings;
use crate::sim::pool::WeatherHazardPool;

/// Outcome of one `process` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Holds the authoritative view of which reports are believable
#[derive(Debug)]
pub struct Authority {
    inbox: Rx,
    inbox_tx: Tx,
    /// Observer channels keyed by the actor each observer controls
    observers: BTreeMap<ActorId, Tx>,
    plausibility_slack: f32,
}

impl Authority {
    pub fn new(settings: &Settings) -> Self {
        let (inbox_tx, inbox) = channel();
        Self {
            inbox,
            inbox_tx,
            observers: BTreeMap::new(),
            plausibility_slack: settings.plausibility_slack.max(0.0),
        }
    }

    /// Sender a client uses to report its local slips
    pub fn client_sender(&self) -> Tx {
        self.inbox_tx.clone()
    }

    /// Subscribe the process controlling `actor_id` to broadcasts
    pub fn register_observer(&mut self, actor_id: ActorId) -> Rx {
        let (tx, rx) = channel();
        if self.observers.insert(actor_id, tx).is_some() {
            log::info!("Observer for {} re-registered", actor_id);
        }
        rx
    }

    /// Stop broadcasting to the process controlling `actor_id`
    pub fn unregister_observer(&mut self, actor_id: ActorId) {
        if self.observers.remove(&actor_id).is_some() {
            log::info!("Observer for {} unregistered", actor_id);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Check that the puddle still exists and the actor could have been on it
    pub fn validate(
        &self,
        event: HazardTriggerEvent,
        position: Vec2,
        pool: &WeatherHazardPool,
    ) -> Result<(), SyncError> {
        let hazard = pool
            .get(event.hazard_id)
            .ok_or(SyncError::UnknownHazard(event.hazard_id))?;

        let distance = hazard.distance_to(position);
        // NaN distance fails this comparison too
        if !(distance <= FALL_ZONE_RADIUS + self.plausibility_slack) {
            return Err(SyncError::ImplausiblePosition {
                hazard: event.hazard_id,
                distance,
            });
        }
        Ok(())
    }

    /// Drain every pending report, rebroadcasting the valid ones to all
    /// observers except the reporter
    pub fn process(&mut self, pool: &WeatherHazardPool) -> RelayReport {
        let mut report = RelayReport::default();

        for msg in self.inbox.drain() {
            let SyncMessage::Report { event, position } = msg else {
                log::warn!("Authority ignoring non-report message {:?}", msg);
                report.rejected += 1;
                continue;
            };

            if let Err(e) = self.validate(event, position, pool) {
                log::warn!("Dropping slip of {} ({}), possible desync", event.actor_id, e);
                report.rejected += 1;
                continue;
            }

            self.broadcast(event);
            report.accepted += 1;
        }

        report
    }

    fn broadcast(&mut self, event: HazardTriggerEvent) {
        let mut closed = Vec::new();
        for (&observer, tx) in &self.observers {
            if observer == event.actor_id {
                continue;
            }
            if tx.send(SyncMessage::Broadcast { event }).is_err() {
                closed.push(observer);
            }
        }
        for observer in closed {
            log::info!("Observer for {} disconnected", observer);
            self.observers.remove(&observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hazard::HazardId;

    /// Pool with a full set of puddles, plus the first one's id and center
    fn wet_pool() -> (WeatherHazardPool, HazardId, Vec2) {
        let mut pool = WeatherHazardPool::new(&Settings::default());
        pool.spawn_batch(3);
        let first = pool.get_active_hazards()[0];
        (pool, first.id, first.center())
    }

    fn report(actor: u32, hazard_id: HazardId, position: Vec2) -> SyncMessage {
        SyncMessage::Report {
            event: HazardTriggerEvent {
                actor_id: ActorId(actor),
                hazard_id,
            },
            position,
        }
    }

    #[test]
    fn test_valid_report_reaches_everyone_but_the_reporter() {
        let (pool, id, center) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let rx1 = authority.register_observer(ActorId(1));
        let rx2 = authority.register_observer(ActorId(2));
        let rx3 = authority.register_observer(ActorId(3));

        let msg = report(1, id, center);
        authority.client_sender().send(msg.clone()).unwrap();
        let result = authority.process(&pool);
        assert_eq!(result, RelayReport { accepted: 1, rejected: 0 });

        assert!(rx1.drain().is_empty());
        for rx in [&rx2, &rx3] {
            let got = rx.drain();
            assert_eq!(got, vec![SyncMessage::Broadcast { event: msg.event() }]);
        }
    }

    #[test]
    fn test_unknown_hazard_is_dropped() {
        let (pool, id, center) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let rx2 = authority.register_observer(ActorId(2));

        // Same slot, later generation: the puddle the client saw is gone
        let stale = HazardId {
            slot: id.slot,
            generation: id.generation + 1,
        };

        authority.client_sender().send(report(1, stale, center)).unwrap();
        assert_eq!(authority.process(&pool).rejected, 1);
        assert!(rx2.drain().is_empty());
        assert!(matches!(
            authority.validate(report(1, stale, center).event(), center, &pool),
            Err(SyncError::UnknownHazard(h)) if h == stale
        ));
    }

    #[test]
    fn test_implausible_position_is_dropped() {
        let (pool, id, center) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let rx2 = authority.register_observer(ActorId(2));

        let far = center + Vec2::new(FALL_ZONE_RADIUS + 50.0, 0.0);
        authority.client_sender().send(report(1, id, far)).unwrap();
        authority
            .client_sender()
            .send(report(1, id, Vec2::new(f32::NAN, 0.0)))
            .unwrap();
        assert_eq!(authority.process(&pool), RelayReport { accepted: 0, rejected: 2 });
        assert!(rx2.drain().is_empty());
    }

    #[test]
    fn test_slack_tolerates_small_drift() {
        let (pool, id, center) = wet_pool();
        let authority = Authority::new(&Settings::default());
        let drifted = center + Vec2::new(FALL_ZONE_RADIUS + 2.0, 0.0);
        let event = report(1, id, drifted).event();
        assert!(authority.validate(event, drifted, &pool).is_ok());
    }

    #[test]
    fn test_broadcast_is_not_accepted_inbound() {
        let (pool, id, _) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let event = report(1, id, Vec2::ZERO).event();
        authority
            .client_sender()
            .send(SyncMessage::Broadcast { event })
            .unwrap();
        assert_eq!(authority.process(&pool).rejected, 1);
    }

    #[test]
    fn test_disconnected_observer_is_pruned() {
        let (pool, id, center) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let rx2 = authority.register_observer(ActorId(2));
        let _rx3 = authority.register_observer(ActorId(3));
        drop(rx2);

        authority.client_sender().send(report(1, id, center)).unwrap();
        authority.process(&pool);
        assert_eq!(authority.observer_count(), 1);
    }

    #[test]
    fn test_unregistered_observer_gets_nothing() {
        let (pool, id, center) = wet_pool();
        let mut authority = Authority::new(&Settings::default());
        let rx2 = authority.register_observer(ActorId(2));
        let rx3 = authority.register_observer(ActorId(3));
        authority.unregister_observer(ActorId(2));
        authority.unregister_observer(ActorId(9));
        assert_eq!(authority.observer_count(), 1);

        authority.client_sender().send(report(1, id, center)).unwrap();
        assert_eq!(authority.process(&pool).accepted, 1);
        assert!(rx2.drain().is_empty());
        assert_eq!(rx3.drain().len(), 1);
    }
}
