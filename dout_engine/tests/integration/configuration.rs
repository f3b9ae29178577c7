//! Integration test: channel configuration lifecycle.
//!
//! Busy / unconfigured / wrong-direction handling over the whole channel
//! table, voltage limits, variants and the configuration phase.

use std::fs;

use dout_common::channel::{CHANNEL_TABLE, ChannelCaps, HardwareVariant, PullConfig};
use dout_common::config::EngineConfig;
use dout_common::error::DoutError;
use dout_common::state::CyclePhase;
use dout_engine::{FeedbackSample, OutputInit, VoltageLimits};
use tempfile::TempDir;

use super::{drive_to_trip, engine, engine_with, safety_config};

#[test]
fn second_init_without_deinit_is_busy() {
    let (mut e, _) = engine();
    for desc in CHANNEL_TABLE.iter() {
        let id = desc.id;
        if desc.is_output() {
            e.init_output(id, OutputInit::default()).unwrap();
            assert_eq!(e.init_output(id, OutputInit::default()), Err(DoutError::ChannelBusy));
        } else {
            e.init_input(id, PullConfig::None, None).unwrap();
            assert_eq!(e.init_input(id, PullConfig::None, None), Err(DoutError::ChannelBusy));
        }
        assert!(e.is_configured(id));
    }
}

#[test]
fn deinit_of_unconfigured_channel_changes_nothing() {
    let (mut e, _) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    e.init_input(24, PullConfig::PullDown, None).unwrap();

    assert_eq!(e.deinit_output(3), Err(DoutError::NotConfigured));
    assert_eq!(e.deinit_input(25), Err(DoutError::NotConfigured));

    for desc in CHANNEL_TABLE.iter() {
        assert_eq!(e.is_configured(desc.id), desc.id == 2 || desc.id == 24);
    }
    assert_eq!(e.diagnostics_enabled(2), Ok(true));
}

#[test]
fn deinit_checks_direction() {
    let (mut e, _) = engine();
    e.init_output(2, OutputInit::default()).unwrap();
    assert_eq!(e.deinit_input(2), Err(DoutError::CapabilityMismatch));
    assert!(e.is_configured(2));
    assert_eq!(e.deinit_output(200), Err(DoutError::InvalidChannelId));
}

#[test]
fn omitted_limits_use_default_bands() {
    let (mut e, _) = engine();
    e.init_input(24, PullConfig::None, None).unwrap();
    e.tick(&[FeedbackSample::voltage(24, 2499)]);
    assert_eq!(e.get_input(24), Ok(false));
    e.tick(&[FeedbackSample::voltage(24, 2500)]);
    assert_eq!(e.get_input(24), Ok(true));
    e.tick(&[FeedbackSample::voltage(24, 32_001)]);
    assert_eq!(e.get_input(24), Err(DoutError::InvalidVoltage));
}

#[test]
fn misordered_limits_rejected_at_init() {
    let (mut e, _) = engine();
    let bad = VoltageLimits::new(0, 3000, 2500, 32000);
    assert_eq!(e.init_input(26, PullConfig::None, Some(bad)), Err(DoutError::InvalidLimits));
    assert!(!e.is_configured(26));
}

#[test]
fn pull_only_where_supported() {
    let (mut e, _) = engine();
    assert_eq!(e.init_input(29, PullConfig::PullUp, None), Err(DoutError::InvalidParameter));
    e.init_input(29, PullConfig::None, None).unwrap();
    e.init_input(27, PullConfig::PullUp, None).unwrap();
}

#[test]
fn base_variant_hides_extended_channels() {
    let config = EngineConfig {
        variant: HardwareVariant::Base,
        ..safety_config()
    };
    let (mut e, _) = engine_with(config);
    assert_eq!(e.init_output(17, OutputInit::default()), Err(DoutError::InvalidChannelId));
    assert_eq!(e.init_input(31, PullConfig::None, None), Err(DoutError::InvalidChannelId));
    e.init_output(15, OutputInit::default()).unwrap();
}

#[test]
fn configuration_closes_with_first_tick() {
    let (mut e, _) = engine();
    e.init_output(2, OutputInit::default()).unwrap();
    e.init_input(24, PullConfig::None, None).unwrap();
    assert_eq!(e.phase(), CyclePhase::Configuration);

    e.tick(&[]);
    assert_eq!(e.phase(), CyclePhase::Cyclic);
    assert_eq!(e.init_output(3, OutputInit::default()), Err(DoutError::ConfigPhaseClosed));

    // Deinit stays available.
    e.deinit_output(2).unwrap();
    e.deinit_input(24).unwrap();
    assert_eq!(e.init_output(2, OutputInit::default()), Err(DoutError::ConfigPhaseClosed));
}

#[test]
fn inputs_can_be_configured_while_cyclic() {
    let (mut e, _) = engine();
    e.tick(&[]);
    assert_eq!(e.phase(), CyclePhase::Cyclic);

    e.init_input(25, PullConfig::PullUp, None).unwrap();
    e.tick(&[FeedbackSample::voltage(25, 12_000)]);
    assert_eq!(e.get_input(25), Ok(true));
    assert_eq!(e.init_input(25, PullConfig::None, None), Err(DoutError::ChannelBusy));
}

#[test]
fn identity_errors_take_precedence_over_phase() {
    let (mut e, _) = engine();
    e.init_output(2, OutputInit::default()).unwrap();
    e.tick(&[]);
    assert_eq!(e.init_output(99, OutputInit::default()), Err(DoutError::InvalidChannelId));
    assert_eq!(e.init_output(24, OutputInit::default()), Err(DoutError::CapabilityMismatch));
    assert_eq!(e.init_output(2, OutputInit::default()), Err(DoutError::ChannelBusy));
}

#[test]
fn safety_relevant_output_needs_global_config() {
    let (mut e, _) = engine_with(EngineConfig::default());
    for desc in CHANNEL_TABLE.iter().filter(|d| d.has(ChannelCaps::SAFETY_RELEVANT)) {
        assert_eq!(
            e.init_output(desc.id, OutputInit::default()),
            Err(DoutError::SafetyConfigMissing)
        );
    }
    e.init_output(2, OutputInit::default()).unwrap();
}

#[test]
fn group_profile_from_config_file_changes_wait() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dout.toml");
    fs::write(
        &path,
        r#"
[safety]

[groups.direct_a]
polarity = "high_side"
feedback = "analog"
wait_ms = 2000
settle_ms = 10
startup_ms = 0
open_load_ma = 20
short_ma = 2500
off_fault_mv = 4000

[groups.direct_a.overcurrent]
rule = "sustained"
threshold_ma = 3000
window_ms = 50
"#,
    )
    .unwrap();
    let config = EngineConfig::load_validated(&path).unwrap();
    let (mut e, clock) = engine_with(config);
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();

    let tripped_at = drive_to_trip(&mut e, &clock, 2, 3500);
    // Trip qualified after the shorter window (10 ms settle + 50 ms).
    assert_eq!(tripped_at, 60);

    clock.advance_ms(1000);
    assert_eq!(e.reset_protection(2), Err(DoutError::FetProtectionWait));
    clock.advance_ms(1000);
    assert_eq!(e.reset_protection(2), Ok(1));
}
