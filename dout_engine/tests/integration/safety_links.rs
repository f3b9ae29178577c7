//! Integration test: safety links between high-side and low-side outputs.

use dout_common::config::{EngineConfig, GlobalSafetyConfig};
use dout_common::error::DoutError;
use dout_engine::OutputInit;

use super::{engine, engine_with};

fn strict_config() -> EngineConfig {
    EngineConfig {
        safety: Some(GlobalSafetyConfig { require_link: true }),
        ..EngineConfig::default()
    }
}

#[test]
fn link_forces_diagnostics_on() {
    let (mut e, _) = engine();
    e.init_output(0, OutputInit::linked(8)).unwrap();
    assert_eq!(e.diagnostics_enabled(0), Ok(true));
    assert_eq!(e.safety_partner(0), Some(8));
    assert_eq!(e.safety_partner(8), Some(0));
}

#[test]
fn mutual_declaration_is_one_pair() {
    let (mut e, _) = engine();
    e.init_output(0, OutputInit::linked(8)).unwrap();
    e.init_output(8, OutputInit::linked(0)).unwrap();
    assert_eq!(e.safety_partner(0), Some(8));
    assert_eq!(e.safety_partner(8), Some(0));
}

#[test]
fn third_party_cannot_join_a_pair() {
    let (mut e, _) = engine();
    e.init_output(0, OutputInit::linked(8)).unwrap();
    assert_eq!(e.init_output(1, OutputInit::linked(8)), Err(DoutError::InvalidSafetyConfig));
    assert_eq!(e.init_output(9, OutputInit::linked(0)), Err(DoutError::InvalidSafetyConfig));
    assert!(!e.is_configured(1));
    assert!(!e.is_configured(9));

    // The rejected channels still pair with each other.
    e.init_output(1, OutputInit::linked(9)).unwrap();
    assert_eq!(e.safety_partner(9), Some(1));
}

#[test]
fn partner_must_be_compatible() {
    let (mut e, _) = engine();
    // Same polarity.
    assert_eq!(e.init_output(0, OutputInit::linked(1)), Err(DoutError::InvalidSafetyConfig));
    // Partner without link capability.
    assert_eq!(e.init_output(0, OutputInit::linked(2)), Err(DoutError::InvalidSafetyConfig));
    // Different shut-off group.
    assert_eq!(e.init_output(0, OutputInit::linked(10)), Err(DoutError::InvalidSafetyConfig));
    // Inputs and unknown ids.
    assert_eq!(e.init_output(0, OutputInit::linked(24)), Err(DoutError::InvalidSafetyConfig));
    assert_eq!(e.init_output(0, OutputInit::linked(77)), Err(DoutError::InvalidSafetyConfig));
    // Self.
    assert_eq!(e.init_output(0, OutputInit::linked(0)), Err(DoutError::InvalidSafetyConfig));
}

#[test]
fn link_on_ordinary_output_rejected() {
    let (mut e, _) = engine();
    assert_eq!(e.init_output(2, OutputInit::linked(8)), Err(DoutError::InvalidSafetyConfig));
    assert!(!e.is_configured(2));
}

#[test]
fn strict_safety_config_requires_links() {
    let (mut e, _) = engine_with(strict_config());
    assert_eq!(e.init_output(0, OutputInit::default()), Err(DoutError::InvalidSafetyConfig));
    e.init_output(0, OutputInit::linked(8)).unwrap();
    e.init_output(8, OutputInit::linked(0)).unwrap();
    // Ordinary outputs are unaffected.
    e.init_output(2, OutputInit::default()).unwrap();
}

#[test]
fn deinit_releases_the_link() {
    let (mut e, _) = engine();
    e.init_output(0, OutputInit::linked(8)).unwrap();
    e.init_output(8, OutputInit::default()).unwrap();
    assert_eq!(e.safety_partner(8), Some(0));

    e.deinit_output(0).unwrap();
    assert_eq!(e.safety_partner(8), None);
    assert_eq!(e.safety_partner(0), None);

    e.init_output(1, OutputInit::linked(8)).unwrap();
    assert_eq!(e.safety_partner(8), Some(1));
}
