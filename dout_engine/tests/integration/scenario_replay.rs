//! Integration test: replay of the shipped scenario and configuration.

use std::path::PathBuf;

use dout_common::config::EngineConfig;
use dout_common::state::ProtectionState;
use dout_engine::scenario::Scenario;

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn shipped_config_is_valid() {
    let config = EngineConfig::load_validated(&manifest_path("config/dout.toml")).unwrap();
    assert!(config.safety.is_some());
    assert_eq!(config.shared.service_name, "dout-01");
}

#[test]
fn overcurrent_retry_scenario() {
    let scenario = Scenario::load(&manifest_path("scenarios/overcurrent_retry.toml")).unwrap();
    let config = EngineConfig::load_validated(&manifest_path("config/dout.toml")).unwrap();
    let summary = scenario.run(config).unwrap();

    assert_eq!(summary.cycles, 109);
    assert_eq!(summary.trips, 1);
    assert_eq!(summary.reenables, 1);
    assert_eq!(summary.resets_refused, 1);
    assert_eq!(summary.resets_accepted, 1);
    // Tripped, powerless and safe-state commands.
    assert_eq!(summary.sets_rejected, 3);
    assert!(summary.spi_frames >= 1);
    assert_eq!(
        summary.final_states,
        vec![(2, ProtectionState::Normal), (10, ProtectionState::Normal)]
    );
}
