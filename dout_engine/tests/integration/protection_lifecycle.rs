//! Integration test: protection trip, wait, reset and permanent lockout.

use dout_common::error::DoutError;
use dout_common::state::ProtectionState;
use dout_engine::{FeedbackSample, OutputInit};

use super::{drive_to_trip, engine};

#[test]
fn trip_forces_output_low_and_blocks_set() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    drive_to_trip(&mut e, &clock, 2, 3500);

    assert_eq!(e.get_output(2), Ok(false));
    assert!(!e.output_bank().get(2));
    assert_eq!(e.protection_status(2).unwrap().state, ProtectionState::Tripped);
    assert_eq!(e.set(2, true), Err(DoutError::FetProtectionActive));
}

#[test]
fn reenable_is_observed_without_a_tick() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    drive_to_trip(&mut e, &clock, 2, 3500);

    clock.advance_ms(1000);
    assert_eq!(e.set(2, true), Err(DoutError::FetProtectionReenable));
    assert_eq!(e.protection_status(2).unwrap().state, ProtectionState::Reenable);

    assert_eq!(e.reset_protection(2), Ok(1));
    assert_eq!(e.protection_status(2).unwrap().state, ProtectionState::Normal);
    // Reset never re-asserts the previous command.
    assert_eq!(e.get_output(2), Ok(false));
    assert!(!e.output_bank().get(2));

    e.set(2, true).unwrap();
    assert_eq!(e.get_output(2), Ok(true));
    assert!(e.output_bank().get(2));
}

#[test]
fn reset_before_wait_elapsed_is_refused() {
    let (mut e, clock) = engine();
    e.init_output(3, OutputInit::with_diagnostics()).unwrap();
    drive_to_trip(&mut e, &clock, 3, 3500);

    clock.advance_ms(500);
    assert_eq!(e.reset_protection(3), Err(DoutError::FetProtectionWait));
    clock.advance_ms(499);
    assert_eq!(e.reset_protection(3), Err(DoutError::FetProtectionWait));
    clock.advance_ms(1);
    assert_eq!(e.reset_protection(3), Ok(1));
}

#[test]
fn reset_in_normal_is_not_active() {
    let (mut e, _) = engine();
    e.init_output(4, OutputInit::default()).unwrap();
    assert_eq!(e.reset_protection(4), Err(DoutError::FetProtectionNotActive));
    assert_eq!(e.protection_status(4).unwrap().reset_count, 0);
}

#[test]
fn ten_resets_then_permanent() {
    let (mut e, clock) = engine();
    e.init_output(5, OutputInit::with_diagnostics()).unwrap();

    for expected in 1..=10u8 {
        drive_to_trip(&mut e, &clock, 5, 3500);
        clock.advance_ms(1000);
        assert_eq!(e.reset_protection(5), Ok(expected));
    }

    drive_to_trip(&mut e, &clock, 5, 3500);
    clock.advance_ms(1000);
    assert_eq!(e.reset_protection(5), Err(DoutError::FetProtectionPermanent));

    let status = e.protection_status(5).unwrap();
    assert_eq!(status.state, ProtectionState::Permanent);
    assert_eq!(status.reset_count, 10);

    // Terminal for the session.
    clock.advance_ms(60_000);
    e.tick(&[]);
    assert_eq!(e.set(5, true), Err(DoutError::FetProtectionPermanent));
    assert_eq!(e.reset_protection(5), Err(DoutError::FetProtectionPermanent));
    assert_eq!(e.get_output(5), Ok(false));
}

#[test]
fn permanent_survives_deinit() {
    let (mut e, clock) = engine();
    e.init_output(6, OutputInit::with_diagnostics()).unwrap();
    for _ in 0..10 {
        drive_to_trip(&mut e, &clock, 6, 3500);
        clock.advance_ms(1000);
        e.reset_protection(6).unwrap();
    }
    drive_to_trip(&mut e, &clock, 6, 3500);
    clock.advance_ms(1000);
    assert!(e.reset_protection(6).is_err());

    e.deinit_output(6).unwrap();
    assert_eq!(e.protection_status(6).unwrap().state, ProtectionState::Permanent);
}

#[test]
fn deinit_clears_pending_trip() {
    let (mut e, clock) = engine();
    e.init_output(7, OutputInit::with_diagnostics()).unwrap();
    drive_to_trip(&mut e, &clock, 7, 3500);
    clock.advance_ms(1000);
    e.reset_protection(7).unwrap();
    drive_to_trip(&mut e, &clock, 7, 3500);

    e.deinit_output(7).unwrap();
    let status = e.protection_status(7).unwrap();
    assert_eq!(status.state, ProtectionState::Normal);
    assert_eq!(status.reset_count, 1);
}

#[test]
fn trip_reported_once_and_reenable_reported_by_tick() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    drive_to_trip(&mut e, &clock, 2, 3500);

    let mut reenabled_at = None;
    for _ in 0..1100 {
        clock.advance_ms(1);
        let report = e.tick(&[FeedbackSample::current(2, 3500)]);
        assert!(report.trips.is_empty());
        if report.reenabled.contains(&2) {
            reenabled_at.get_or_insert(clock.now_ms());
        }
    }
    assert_eq!(e.protection_status(2).unwrap().state, ProtectionState::Reenable);
    assert!(reenabled_at.is_some());
}

#[test]
fn low_side_ceiling_trips_after_consecutive_samples() {
    let (mut e, clock) = engine();
    e.init_output(10, OutputInit::with_diagnostics()).unwrap();
    e.set(10, true).unwrap();
    clock.advance_ms(10);

    for _ in 0..2 {
        assert!(e.tick(&[FeedbackSample::current(10, 7000)]).trips.is_empty());
        clock.advance_ms(1);
    }
    // A sample below the ceiling restarts the count.
    e.tick(&[FeedbackSample::current(10, 1000)]);
    for _ in 0..2 {
        clock.advance_ms(1);
        assert!(e.tick(&[FeedbackSample::current(10, 7000)]).trips.is_empty());
    }
    clock.advance_ms(1);
    assert_eq!(e.tick(&[FeedbackSample::current(10, 7000)]).trips.as_slice(), &[10]);
}

#[test]
fn spi_stage_shutoff_waits_ten_seconds() {
    let (mut e, clock) = engine();
    e.init_output(12, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(20);
    e.set(12, true).unwrap();
    clock.advance_ms(20);

    let report = e.tick(&[FeedbackSample::digital(12, true)]);
    assert_eq!(report.trips.as_slice(), &[12]);

    clock.advance_ms(9_999);
    assert_eq!(e.reset_protection(12), Err(DoutError::FetProtectionWait));
    clock.advance_ms(1);
    assert_eq!(e.reset_protection(12), Ok(1));
}

#[test]
fn overcurrent_during_settle_window_is_ignored() {
    let (mut e, clock) = engine();
    e.init_output(20, OutputInit::with_diagnostics()).unwrap();
    clock.advance_ms(5);
    e.set(20, true).unwrap();
    for _ in 0..9 {
        clock.advance_ms(1);
        let report = e.tick(&[
            FeedbackSample::digital(20, true),
            FeedbackSample::current(20, 9000),
        ]);
        assert!(report.trips.is_empty());
    }
    assert_eq!(e.protection_status(20).unwrap().state, ProtectionState::Normal);
}

#[test]
fn sparse_overcurrent_samples_do_not_trip() {
    let (mut e, clock) = engine();
    e.init_output(2, OutputInit::with_diagnostics()).unwrap();
    e.set(2, true).unwrap();
    clock.advance_ms(10);

    assert!(e.tick(&[FeedbackSample::current(2, 3500)]).trips.is_empty());
    for _ in 0..99 {
        clock.advance_ms(1);
        assert!(e.tick(&[]).trips.is_empty());
    }
    clock.advance_ms(1);
    assert!(e.tick(&[FeedbackSample::current(2, 3500)]).trips.is_empty());
    assert_eq!(e.protection_status(2).unwrap().state, ProtectionState::Normal);
}
