//! Fixed timestep simulation tick
//!
//! Advances the puddle pool, every local actor and every remote replay in a
//! fixed order:
//! 1. pool lifecycle (including trigger cleanup on the way back to dry)
//! 2. per local actor: slip detection, then reaction advance, then edge reset
//! 3. remote replays already running
//! 4. newly received broadcasts start their replays

use std::collections::BTreeMap;

use glam::Vec2;

use super::controller::ControllerStep;
use super::pool::{PoolTransition, WeatherSample};
use super::state::HazardWorld;
use crate::ActorId;
use crate::sync::{HazardTriggerEvent, Rx, SyncMessage};

/// Inputs for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Reading from the weather collaborator
    pub weather: WeatherSample,
    /// Where the movement collaborator wants each local actor. Actors
    /// without an entry stay put.
    pub actor_targets: BTreeMap<ActorId, Vec2>,
}

impl TickInput {
    pub fn new(weather: WeatherSample) -> Self {
        Self {
            weather,
            actor_targets: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, actor: ActorId, target: Vec2) -> Self {
        self.actor_targets.insert(actor, target);
        self
    }
}

/// What happened during a tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub transition: Option<PoolTransition>,
    pub steps: Vec<(ActorId, ControllerStep)>,
    /// Remote slips whose replay started this tick
    pub replayed: Vec<HazardTriggerEvent>,
}

impl TickReport {
    /// Local slips this tick
    pub fn triggered(&self) -> impl Iterator<Item = HazardTriggerEvent> + '_ {
        self.steps.iter().filter_map(|(_, step)| match step {
            ControllerStep::Triggered(event) => Some(*event),
            _ => None,
        })
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut HazardWorld, input: &TickInput, dt: f32) -> TickReport {
    world.time_ticks += 1;
    let mut report = TickReport {
        transition: world.pool.update(input.weather, dt, &mut world.actors),
        ..Default::default()
    };

    // The snapshot borrow keeps the pool immutable for the rest of the tick
    let hazards = world.pool.get_active_hazards();
    for actor in &mut world.actors {
        let target = input
            .actor_targets
            .get(&actor.actor_id())
            .copied()
            .unwrap_or_else(|| actor.position());
        let step = actor.tick(target, hazards, dt, &mut *world.relay);
        report.steps.push((actor.actor_id(), step));
    }

    for (actor_id, animator) in &mut world.remotes {
        animator.tick(dt);
        if animator.is_complete() {
            animator.reset();
            log::debug!("Replay of {} finished", actor_id);
        }
    }

    let inbound = world.inbox.as_ref().map(Rx::drain).unwrap_or_default();
    for msg in inbound {
        match msg {
            SyncMessage::Broadcast { event } => {
                if world.on_remote_hazard_trigger(event.actor_id, event.hazard_id) {
                    report.replayed.push(event);
                }
            }
            SyncMessage::Report { event, .. } => {
                log::warn!("Observer got a raw report from {}, ignoring", event.actor_id);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FALL_ZONE_RADIUS, SIM_DT};
    use crate::settings::Settings;
    use crate::sim::pool::HazardPoolState;
    use crate::sync::{Authority, ChannelRelay};

    const ME: ActorId = ActorId(1);
    const THEM: ActorId = ActorId(2);

    fn rain() -> TickInput {
        TickInput::new(WeatherSample::raining(1.0))
    }

    /// Tick in the rain until puddles form
    fn soak(world: &mut HazardWorld) {
        for _ in 0..2000 {
            tick(world, &rain(), SIM_DT);
            if world.pool().state() == HazardPoolState::Active {
                return;
            }
        }
        panic!("puddles never formed");
    }

    /// Center of a puddle whose fall zone overlaps no other puddle's center
    fn lonely_puddle(world: &HazardWorld) -> Vec2 {
        let hazards = world.pool().get_active_hazards();
        hazards
            .iter()
            .find(|h| {
                hazards
                    .iter()
                    .filter(|o| o.id != h.id)
                    .all(|o| o.distance_to(h.center()) > FALL_ZONE_RADIUS + 1.0)
            })
            .map(|h| h.center())
            .expect("no isolated puddle for this seed")
    }

    /// A point no puddle's fall zone reaches
    fn dry_spot(world: &HazardWorld) -> Vec2 {
        let spot = Vec2::new(-1000.0, -1000.0);
        assert!(world.pool().get_active_hazards().iter().all(|h| h.distance_to(spot) > 100.0));
        spot
    }

    #[test]
    fn test_slip_during_a_shower() {
        let mut world = HazardWorld::new(&Settings::default());
        world.spawn_actor(ME, Vec2::new(-1000.0, -1000.0));
        soak(&mut world);

        let target = lonely_puddle(&world);
        let report = tick(&mut world, &rain().with_target(ME, target), SIM_DT);
        let slips: Vec<_> = report.triggered().collect();
        assert_eq!(slips.len(), 1);
        assert_eq!(slips[0].actor_id, ME);
        assert!((world.actor(ME).unwrap().health().current - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_standing_in_a_puddle_hurts_once() {
        let mut world = HazardWorld::new(&Settings::default());
        world.spawn_actor(ME, Vec2::new(-1000.0, -1000.0));
        soak(&mut world);

        let target = lonely_puddle(&world);
        let input = rain().with_target(ME, target);
        let mut slips = 0;
        for _ in 0..600 {
            slips += tick(&mut world, &input, SIM_DT).triggered().count();
        }
        assert_eq!(slips, 1);
    }

    #[test]
    fn test_evaporation_clears_actor_trigger_state() {
        let mut world = HazardWorld::new(&Settings::default());
        world.spawn_actor(ME, Vec2::new(-1000.0, -1000.0));
        soak(&mut world);

        let target = lonely_puddle(&world);
        tick(&mut world, &rain().with_target(ME, target), SIM_DT);
        assert_eq!(world.actor(ME).unwrap().tracker().triggered_count(), 1);

        let dry = TickInput::new(WeatherSample::dry());
        for _ in 0..(9.0 / SIM_DT) as usize {
            tick(&mut world, &dry, SIM_DT);
        }
        assert_eq!(world.pool().state(), HazardPoolState::None);
        assert_eq!(world.actor(ME).unwrap().tracker().triggered_count(), 0);
    }

    #[test]
    fn test_client_authority_observer_round_trip() {
        let settings = Settings::default();
        let mut authority = Authority::new(&settings);
        let client_inbox = authority.register_observer(ME);
        let observer_inbox = authority.register_observer(THEM);

        let mut client = HazardWorld::new(&settings)
            .with_relay(Box::new(ChannelRelay::new(authority.client_sender())))
            .with_inbox(client_inbox);
        client.spawn_actor(ME, Vec2::new(-1000.0, -1000.0));

        let mut observer = HazardWorld::new(&settings).with_inbox(observer_inbox);
        observer.spawn_actor(THEM, Vec2::new(-1000.0, -1000.0));

        soak(&mut client);
        soak(&mut observer);
        // Same seed, same puddles
        assert_eq!(client.pool().get_active_hazards(), observer.pool().get_active_hazards());

        let target = lonely_puddle(&client);
        tick(&mut client, &rain().with_target(ME, target), SIM_DT);

        let relayed = authority.process(client.pool());
        assert_eq!(relayed.accepted, 1);

        let spot = dry_spot(&observer);
        let report = tick(&mut observer, &rain().with_target(THEM, spot), SIM_DT);
        assert_eq!(report.replayed.len(), 1);
        assert_eq!(report.replayed[0].actor_id, ME);
        assert!(observer.is_remote_reacting(ME));
        // Observer's own actor is untouched
        let them = observer.actor(THEM).unwrap();
        assert_eq!(them.health().current, 100.0);
        assert!(!them.is_frozen());

        // The reporter never hears its own slip back
        let echo = tick(&mut client, &rain(), SIM_DT);
        assert!(echo.replayed.is_empty());
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs end up identical
        let settings = Settings {
            seed: 99999,
            ..Default::default()
        };
        let mut a = HazardWorld::new(&settings);
        let mut b = HazardWorld::new(&settings);
        a.spawn_actor(ME, Vec2::ZERO);
        b.spawn_actor(ME, Vec2::ZERO);

        for i in 0..900 {
            let x = (i as f32 * 0.7) % 480.0;
            let input = rain().with_target(ME, Vec2::new(x, 135.0));
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.pool().get_active_hazards(), b.pool().get_active_hazards());
        let (ma, mb) = (a.actor(ME).unwrap(), b.actor(ME).unwrap());
        assert_eq!(ma.health(), mb.health());
        assert_eq!(ma.position(), mb.position());
    }
}
