mod configuration;
mod diagnostics;
mod protection_lifecycle;
mod safety_links;
mod scenario_replay;

use dout_common::channel::ChannelId;
use dout_common::config::{EngineConfig, GlobalSafetyConfig};
use dout_engine::{FeedbackSample, ManualClock, OutputEngine, PowerStatus};

// ── Helpers ─────────────────────────────────────────────────────────

pub(crate) fn safety_config() -> EngineConfig {
    EngineConfig {
        safety: Some(GlobalSafetyConfig::default()),
        ..EngineConfig::default()
    }
}

/// Engine on a manual clock with every shut-off group powered.
pub(crate) fn engine_with(config: EngineConfig) -> (OutputEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let mut engine = OutputEngine::new(config, clock.clone()).unwrap();
    engine.apply_power_status(PowerStatus::all_enabled());
    (engine, clock)
}

pub(crate) fn engine() -> (OutputEngine<ManualClock>, ManualClock) {
    engine_with(safety_config())
}

/// Switch an analog-feedback output on and feed 1 ms overcurrent samples
/// until it trips. Returns the trip time [ms].
pub(crate) fn drive_to_trip(
    engine: &mut OutputEngine<ManualClock>,
    clock: &ManualClock,
    channel: ChannelId,
    milliamps: u16,
) -> u64 {
    engine.set(channel, true).unwrap();
    clock.advance_ms(10);
    for _ in 0..500 {
        let report = engine.tick(&[FeedbackSample::current(channel, milliamps)]);
        if report.trips.contains(&channel) {
            return clock.now_ms();
        }
        clock.advance_ms(1);
    }
    panic!("channel {channel} did not trip");
}
