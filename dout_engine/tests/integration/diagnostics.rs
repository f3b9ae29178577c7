//! Integration test: diagnostic classification through the cycle driver.

use dout_common::error::DoutError;
use dout_common::state::DiagnosticTag;
use dout_engine::{DiagnosticSample, FeedbackSample, OutputInit, Reading, SetOutcome};

use super::engine;

#[test]
fn settle_window_then_classification() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    e.set(2, true).unwrap();

    clock.advance_ms(5);
    let report = e.tick(&[FeedbackSample::current(2, 5)]);
    assert_eq!(
        report.diagnostic(2).unwrap().sample.tag,
        DiagnosticTag::NoDiagnosticAvailable
    );

    clock.advance_ms(5);
    let report = e.tick(&[FeedbackSample::current(2, 5)]);
    assert_eq!(
        report.diagnostic(2).unwrap().sample,
        DiagnosticSample {
            tag: DiagnosticTag::OpenLoad,
            raw: 5,
            fresh: true
        }
    );
}

#[test]
fn missing_sample_is_reported_stale() {
    let (mut e, clock) = engine();
    e.init_output(3, OutputInit::with_diagnostics()).unwrap();
    e.set(3, true).unwrap();
    clock.advance_ms(10);
    e.tick(&[FeedbackSample::current(3, 800)]);

    clock.advance_ms(1);
    let sample = e.tick(&[]).diagnostic(3).unwrap().sample;
    assert_eq!(sample.tag, DiagnosticTag::Ok);
    assert!(!sample.fresh);

    // A repeated conversion is not new data either.
    clock.advance_ms(1);
    let sample = e.tick(&[FeedbackSample::current(3, 5).stale()]).diagnostic(3).unwrap().sample;
    assert_eq!(sample.tag, DiagnosticTag::Ok);
    assert!(!sample.fresh);
}

#[test]
fn never_sampled_is_unavailable() {
    let (mut e, clock) = engine();
    e.init_output(4, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(50);
    let report = e.tick(&[]);
    assert_eq!(report.diagnostic(4).unwrap().sample, DiagnosticSample::UNAVAILABLE);
}

#[test]
fn off_state_faults_per_polarity() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    e.init_output(10, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(10);

    let report = e.tick(&[
        FeedbackSample::voltage(2, 13_000),
        FeedbackSample::voltage(10, 200),
    ]);
    assert_eq!(report.diagnostic(2).unwrap().sample.tag, DiagnosticTag::ShortBattery);
    assert_eq!(report.diagnostic(10).unwrap().sample.tag, DiagnosticTag::OpenLoad);
}

#[test]
fn spi_group_startup_and_ambiguous_off_state() {
    let (mut e, clock) = engine();
    e.init_output(14, OutputInit::with_diagnostics()).unwrap();

    clock.advance_ms(10);
    let report = e.tick(&[FeedbackSample::voltage(14, 6000)]);
    assert_eq!(report.diagnostic(14).unwrap().sample.tag, DiagnosticTag::Startup);

    clock.advance_ms(10);
    let report = e.tick(&[FeedbackSample::voltage(14, 6000)]);
    assert_eq!(
        report.diagnostic(14).unwrap().sample.tag,
        DiagnosticTag::OpenLoadOrShortBattery
    );
}

#[test]
fn timer_feedback_detects_pin_held_low() {
    let (mut e, clock) = engine();
    e.init_output(21, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(5);
    e.set(21, true).unwrap();
    clock.advance_ms(10);
    let report = e.tick(&[
        FeedbackSample::digital(21, false),
        FeedbackSample::current(21, 0),
    ]);
    assert_eq!(report.diagnostic(21).unwrap().sample.tag, DiagnosticTag::ShortGround);
}

#[test]
fn fault_is_advisory_not_blocking() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    e.set(2, true).unwrap();
    clock.advance_ms(10);
    // Above the short threshold, below the overcurrent rule.
    e.tick(&[FeedbackSample::current(2, 2700)]);

    assert_eq!(e.set(2, false), Ok(SetOutcome::Advisory(DoutError::ShortGround)));
    assert_eq!(e.get_output(2), Ok(false));
}

#[test]
fn healthy_output_accepts_without_advisory() {
    let (mut e, clock) = engine();
    e.init_output(3, OutputInit::with_diagnostics()).unwrap();
    e.set(3, true).unwrap();
    clock.advance_ms(10);
    e.tick(&[FeedbackSample::current(3, 900)]);
    assert_eq!(e.set(3, true), Ok(SetOutcome::Accepted));
}

#[test]
fn current_read_is_idempotent_after_first_fresh_read() {
    let (mut e, clock) = engine();
    e.init_output(5, OutputInit::with_diagnostics()).unwrap();
    e.tick(&[FeedbackSample::current(5, 640)]);

    assert_eq!(e.get_current(5), Ok(Reading { raw: 640, fresh: true }));
    for _ in 0..5 {
        assert_eq!(e.get_current(5), Ok(Reading { raw: 640, fresh: false }));
    }

    clock.advance_ms(1);
    e.tick(&[]);
    assert_eq!(e.get_current(5), Ok(Reading { raw: 640, fresh: false }));

    e.tick(&[FeedbackSample::current(5, 650)]);
    assert_eq!(e.get_current(5), Ok(Reading { raw: 650, fresh: true }));
}

#[test]
fn voltage_read_on_output() {
    let (mut e, _) = engine();
    e.init_output(6, OutputInit::default()).unwrap();
    e.tick(&[FeedbackSample::voltage(6, 11_900)]);
    assert_eq!(e.get_voltage(6), Ok(Reading { raw: 11_900, fresh: true }));
    assert_eq!(e.get_voltage(20), Err(DoutError::CapabilityMismatch));
}

#[test]
fn disabled_diagnostics_are_not_published() {
    let (mut e, clock) = engine();
    e.init_output(7, OutputInit::default()).unwrap();
    clock.advance_ms(10);
    let report = e.tick(&[FeedbackSample::voltage(7, 13_000)]);
    assert!(report.diagnostic(7).is_none());
    assert_eq!(e.diagnostic(7), Ok(DiagnosticSample::UNAVAILABLE));
}

#[test]
fn timer_current_from_before_switch_on_is_not_used() {
    let (mut e, clock) = engine();
    e.init_output(20, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(5);
    e.tick(&[FeedbackSample::current(20, 0)]);
    e.set(20, true).unwrap();

    clock.advance_ms(15);
    let sample = e.tick(&[FeedbackSample::digital(20, true)]).diagnostic(20).unwrap().sample;
    assert_eq!(
        sample,
        DiagnosticSample {
            tag: DiagnosticTag::Ok,
            raw: 1,
            fresh: true
        }
    );

    // A current sampled at the new level is used again.
    clock.advance_ms(1);
    let report = e.tick(&[
        FeedbackSample::digital(20, true),
        FeedbackSample::current(20, 0),
    ]);
    assert_eq!(report.diagnostic(20).unwrap().sample.tag, DiagnosticTag::OpenLoad);
}
