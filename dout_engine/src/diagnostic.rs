//! Diagnostic classification and fatal-overcurrent qualification.
//!
//! Each cycle, every configured output with diagnostics enabled gets one
//! [`Classification`]: a tag derived from the latched feedback, the raw value
//! it came from, and whether a fatal overcurrent qualified this cycle.
//!
//! Classification rules, in order:
//! 1. Inside the group's startup window → `Startup`.
//! 2. Inside the settle window after a level change → `NoDiagnosticAvailable`.
//! 3. No fresh primary sample this cycle → previous tag, `fresh = false`.
//! 4. Otherwise the tag follows from polarity, commanded level and feedback.

use std::time::Duration;

use dout_common::channel::{FeedbackSource, GroupProfile, OvercurrentRule, SwitchPolarity};
use dout_common::state::DiagnosticTag;

use crate::feedback::{FeedbackKind, FeedbackLatch};

/// Latest diagnostic result of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticSample {
    pub tag: DiagnosticTag,
    /// Raw primary feedback the tag was derived from.
    pub raw: u16,
    /// A new sample contributed to this result.
    pub fresh: bool,
}

impl DiagnosticSample {
    pub const UNAVAILABLE: Self = Self {
        tag: DiagnosticTag::NoDiagnosticAvailable,
        raw: 0,
        fresh: false,
    };
}

impl Default for DiagnosticSample {
    fn default() -> Self {
        Self::UNAVAILABLE
    }
}

/// Timing context of one classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput {
    pub commanded: bool,
    pub since_init: Duration,
    pub since_change: Duration,
    pub now: Duration,
}

/// Per-cycle classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub sample: DiagnosticSample,
    /// Fatal overcurrent qualified; protection must trip.
    pub overcurrent: bool,
}

/// Feedback signal the tag is derived from.
pub const fn primary_kind(feedback: FeedbackSource, commanded: bool) -> FeedbackKind {
    match (feedback, commanded) {
        (FeedbackSource::Analog, true) => FeedbackKind::Current,
        (FeedbackSource::Analog, false) => FeedbackKind::Voltage,
        (FeedbackSource::StageStatus, true) => FeedbackKind::Digital,
        (FeedbackSource::StageStatus, false) => FeedbackKind::Voltage,
        (FeedbackSource::DigitalTimer, _) => FeedbackKind::Digital,
    }
}

fn on_current(profile: &GroupProfile, milliamps: u16) -> DiagnosticTag {
    if profile.short_ma != 0 && milliamps > profile.short_ma {
        profile.polarity.on_short_tag()
    } else if profile.open_load_ma != 0 && milliamps < profile.open_load_ma {
        DiagnosticTag::OpenLoad
    } else {
        DiagnosticTag::Ok
    }
}

fn off_voltage(profile: &GroupProfile, millivolts: u16) -> DiagnosticTag {
    if profile.off_fault_mv == 0 {
        return DiagnosticTag::Ok;
    }
    let fault = match profile.polarity {
        SwitchPolarity::HighSide if millivolts > profile.off_fault_mv => DiagnosticTag::ShortBattery,
        SwitchPolarity::LowSide if millivolts < profile.off_fault_mv => DiagnosticTag::OpenLoad,
        _ => return DiagnosticTag::Ok,
    };
    if profile.ambiguous_off_state {
        DiagnosticTag::OpenLoadOrShortBattery
    } else {
        fault
    }
}

/// Tag for the latched feedback, ignoring timing windows.
///
/// `level_since` is the time of the last level change. Secondary samples
/// taken at or before it belong to the previous level and are not used.
pub fn evaluate(
    profile: &GroupProfile,
    commanded: bool,
    latch: &FeedbackLatch,
    level_since: Duration,
) -> DiagnosticTag {
    let unavailable = DiagnosticTag::NoDiagnosticAvailable;
    match (profile.feedback, commanded) {
        (FeedbackSource::Analog, true) => latch
            .latest(FeedbackKind::Current)
            .map_or(unavailable, |ma| on_current(profile, ma)),
        (FeedbackSource::Analog | FeedbackSource::StageStatus, false) => latch
            .latest(FeedbackKind::Voltage)
            .map_or(unavailable, |mv| off_voltage(profile, mv)),
        (FeedbackSource::StageStatus, true) => {
            latch
                .latest(FeedbackKind::Digital)
                .map_or(unavailable, |status| {
                    if status != 0 {
                        profile.polarity.on_short_tag()
                    } else {
                        DiagnosticTag::Ok
                    }
                })
        }
        (FeedbackSource::DigitalTimer, commanded) => {
            latch
                .latest(FeedbackKind::Digital)
                .map_or(unavailable, |level| {
                    let expected = profile.polarity.pin_level(commanded);
                    let actual = level != 0;
                    if actual != expected {
                        if actual {
                            DiagnosticTag::ShortBattery
                        } else {
                            DiagnosticTag::ShortGround
                        }
                    } else if commanded {
                        let current_valid = latch
                            .sampled_at(FeedbackKind::Current)
                            .is_some_and(|at| at > level_since);
                        latch
                            .latest(FeedbackKind::Current)
                            .filter(|_| current_valid)
                            .map_or(DiagnosticTag::Ok, |ma| on_current(profile, ma))
                    } else {
                        DiagnosticTag::Ok
                    }
                })
        }
    }
}

// ─── Overcurrent Qualifier ──────────────────────────────────────────

/// Tracks one channel's progress towards a fatal overcurrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OvercurrentQualifier {
    over_since: Option<Duration>,
    consecutive: u8,
}

impl OvercurrentQualifier {
    /// Feed this cycle's fresh samples. Returns `true` once qualified.
    pub fn update(&mut self, rule: &OvercurrentRule, latch: &FeedbackLatch, now: Duration) -> bool {
        match *rule {
            OvercurrentRule::Sustained {
                threshold_ma,
                window_ms,
            } => match latch.pending(FeedbackKind::Current) {
                Some(ma) if ma > threshold_ma => {
                    let since = *self.over_since.get_or_insert(now);
                    now.saturating_sub(since) >= Duration::from_millis(window_ms as u64)
                }
                // A dip or a cycle without a sample breaks continuity.
                _ => {
                    self.over_since = None;
                    false
                }
            },
            OvercurrentRule::Ceiling {
                ceiling_ma,
                samples,
            } => match latch.pending(FeedbackKind::Current) {
                Some(ma) if ma > ceiling_ma => {
                    self.consecutive = self.consecutive.saturating_add(1);
                    self.consecutive >= samples
                }
                Some(_) => {
                    self.consecutive = 0;
                    false
                }
                None => false,
            },
            OvercurrentRule::StageShutoff => {
                matches!(latch.pending(FeedbackKind::Digital), Some(status) if status != 0)
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Channel Classifier ─────────────────────────────────────────────

/// Classification state of one output channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelClassifier {
    last: DiagnosticSample,
    qualifier: OvercurrentQualifier,
}

impl ChannelClassifier {
    pub const fn new() -> Self {
        Self {
            last: DiagnosticSample::UNAVAILABLE,
            qualifier: OvercurrentQualifier {
                over_since: None,
                consecutive: 0,
            },
        }
    }

    #[inline]
    pub const fn last(&self) -> DiagnosticSample {
        self.last
    }

    /// Commanded level changed: discard results from the previous level.
    pub fn level_changed(&mut self) {
        *self = Self::new();
    }

    pub fn classify(
        &mut self,
        profile: &GroupProfile,
        latch: &FeedbackLatch,
        input: ClassifyInput,
    ) -> Classification {
        let kind = primary_kind(profile.feedback, input.commanded);
        let pending = latch.pending(kind);
        let raw = latch.latest(kind).unwrap_or(0);

        let suppressed = if input.since_init < profile.startup_time() {
            Some(DiagnosticTag::Startup)
        } else if input.since_change < profile.settle_time() {
            Some(DiagnosticTag::NoDiagnosticAvailable)
        } else {
            None
        };

        let sample = match (suppressed, pending) {
            (Some(tag), _) => DiagnosticSample {
                tag,
                raw,
                fresh: pending.is_some(),
            },
            (None, Some(raw)) => DiagnosticSample {
                tag: evaluate(
                    profile,
                    input.commanded,
                    latch,
                    input.now.saturating_sub(input.since_change),
                ),
                raw,
                fresh: true,
            },
            (None, None) if latch.latest(kind).is_none() => DiagnosticSample::UNAVAILABLE,
            (None, None) => DiagnosticSample {
                tag: self.last.tag,
                raw,
                fresh: false,
            },
        };
        self.last = sample;

        let overcurrent = if !input.commanded {
            self.qualifier.reset();
            false
        } else if suppressed.is_some() {
            false
        } else {
            self.qualifier
                .update(&profile.overcurrent, latch, input.now)
        };

        Classification {
            sample,
            overcurrent,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
