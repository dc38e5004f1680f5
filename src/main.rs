//! Puddle Hazards headless driver
//!
//! Runs one client, one authority and one observer through a scripted
//! shower and logs what each side saw. Pass a settings JSON path as the
//! first argument to override the defaults.

use std::path::PathBuf;

use glam::Vec2;

use puddle_hazards::ActorId;
use puddle_hazards::consts::{MAX_SUBSTEPS, SIM_DT};
use puddle_hazards::settings::Settings;
use puddle_hazards::sim::{HazardWorld, TickInput, WeatherSample, tick};
use puddle_hazards::sync::{Authority, ChannelRelay};

/// Simulated render frame (30 Hz, two substeps per frame)
const FRAME_DT: f32 = 1.0 / 30.0;
/// Walking speed of the scripted client actor (units per second)
const WALK_SPEED: f32 = 60.0;

const CLIENT: ActorId = ActorId(1);
const OBSERVER: ActorId = ActorId(2);

/// Weather script: (seconds, sample)
fn forecast() -> Vec<(f32, WeatherSample)> {
    vec![
        (2.0, WeatherSample::dry()),
        (12.0, WeatherSample::raining(0.8)),
        (3.0, WeatherSample::dry()),
        (4.0, WeatherSample::raining(0.4)),
        (10.0, WeatherSample::dry()),
    ]
}

/// Step toward the nearest puddle, or stay put when there are none
fn walk_target(world: &HazardWorld, actor_id: ActorId, dt: f32) -> Option<Vec2> {
    let actor = world.actor(actor_id)?;
    let here = actor.position();
    let goal = world
        .pool()
        .get_active_hazards()
        .iter()
        .map(|h| h.center())
        .min_by(|a, b| a.distance(here).total_cmp(&b.distance(here)))?;
    let to_goal = goal - here;
    let step = WALK_SPEED * dt;
    if to_goal.length() <= step {
        Some(goal)
    } else {
        Some(here + to_goal.normalize_or_zero() * step)
    }
}

struct Session {
    authority: Authority,
    client: HazardWorld,
    observer: HazardWorld,
    accumulator: f32,
    slips: usize,
    replays: usize,
}

impl Session {
    fn new(settings: &Settings) -> Self {
        let mut authority = Authority::new(settings);
        let client_inbox = authority.register_observer(CLIENT);
        let observer_inbox = authority.register_observer(OBSERVER);

        let mut client = HazardWorld::new(settings)
            .with_relay(Box::new(ChannelRelay::new(authority.client_sender())))
            .with_inbox(client_inbox);
        client.spawn_actor(CLIENT, Vec2::new(20.0, 20.0));

        let mut observer = HazardWorld::new(settings).with_inbox(observer_inbox);
        observer.spawn_actor(OBSERVER, Vec2::new(-500.0, -500.0));

        Self {
            authority,
            client,
            observer,
            accumulator: 0.0,
            slips: 0,
            replays: 0,
        }
    }

    fn update(&mut self, frame_dt: f32, weather: WeatherSample) {
        self.accumulator += frame_dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let mut input = TickInput::new(weather);
            if let Some(target) = walk_target(&self.client, CLIENT, SIM_DT) {
                input = input.with_target(CLIENT, target);
            }

            let report = tick(&mut self.client, &input, SIM_DT);
            if let Some(transition) = report.transition {
                log::debug!("Client pool {:?} -> {:?}", transition.from, transition.to);
            }
            self.slips += report.triggered().count();

            let relayed = self.authority.process(self.client.pool());
            if relayed.rejected > 0 {
                log::warn!("Authority rejected {} report(s)", relayed.rejected);
            }

            let seen = tick(&mut self.observer, &TickInput::new(weather), SIM_DT);
            for event in &seen.replayed {
                log::info!("Observer replays {} on {}", event.actor_id, event.hazard_id);
            }
            self.replays += seen.replayed.len();

            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .map(|path| Settings::load(&path))
        .unwrap_or_default();
    log::info!("Puddle Hazards starting (seed {:#x})", settings.seed);

    let mut session = Session::new(&settings);
    for (seconds, weather) in forecast() {
        log::info!(
            "Weather: {} for {:.0}s",
            if weather.precipitation_active { "rain" } else { "dry" },
            seconds
        );
        let frames = (seconds / FRAME_DT).round() as usize;
        for _ in 0..frames {
            session.update(FRAME_DT, weather);
        }
    }

    match session.client.actor(CLIENT) {
        Some(actor) => log::info!(
            "{} finished at {:.1}/{:.1} health after {} slip(s)",
            CLIENT,
            actor.health().current,
            actor.health().max,
            session.slips
        ),
        None => log::warn!("{} went missing", CLIENT),
    }
    log::info!(
        "Observer replayed {} slip(s) over {} ticks",
        session.replays,
        session.observer.time_ticks
    );
}
