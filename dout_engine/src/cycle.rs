//! Cycle driver.
//!
//! One [`OutputEngine::tick`] per cycle period:
//! 1. Close the configuration phase on the first tick.
//! 2. Latch the delivered feedback samples.
//! 3. Classify every configured output; qualified overcurrent trips it.
//! 4. Evaluate re-enable timers.
//! 5. Emit the SPI shift-register frame when changed or due.
//!
//! Classification always precedes the protection transition it causes.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use dout_common::bank::OutputBank;
use dout_common::channel::{CHANNEL_TABLE, ChannelGroup, ChannelId};
use dout_common::consts::MAX_CHANNELS;
use dout_common::state::{CyclePhase, ProtectionState};

use crate::clock::Clock;
use crate::diagnostic::{ClassifyInput, DiagnosticSample};
use crate::engine::OutputEngine;
use crate::feedback::FeedbackSample;

/// Diagnostic result of one output in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDiagnostic {
    pub channel: ChannelId,
    pub sample: DiagnosticSample,
}

/// Shift-register image of the SPI-multiplexed outputs.
///
/// Bit N is the N-th `SpiMux` output of the active variant, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiFrame {
    pub bits: u32,
    pub at: Duration,
}

/// What happened during one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle: u64,
    /// Published diagnostics of outputs with diagnostics enabled.
    pub diagnostics: heapless::Vec<ChannelDiagnostic, MAX_CHANNELS>,
    /// Outputs tripped this cycle.
    pub trips: heapless::Vec<ChannelId, MAX_CHANNELS>,
    /// Outputs whose re-enable wait elapsed this cycle.
    pub reenabled: heapless::Vec<ChannelId, MAX_CHANNELS>,
    /// Samples for unknown or unconfigured channels.
    pub dropped_samples: usize,
    pub spi_frame: Option<SpiFrame>,
}

impl CycleReport {
    pub fn diagnostic(&self, channel: ChannelId) -> Option<&ChannelDiagnostic> {
        self.diagnostics.iter().find(|d| d.channel == channel)
    }
}

// ─── SPI Refresh ────────────────────────────────────────────────────

/// Decides when a new SPI frame goes out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpiRefresh {
    last_bits: Option<u32>,
    last_sent: Duration,
}

impl SpiRefresh {
    pub const fn new() -> Self {
        Self {
            last_bits: None,
            last_sent: Duration::ZERO,
        }
    }

    /// Frame to send now, if the image changed or the refresh period elapsed.
    pub fn poll(&mut self, bits: u32, now: Duration, period: Duration) -> Option<SpiFrame> {
        let due = match self.last_bits {
            None => true,
            Some(last) => last != bits || now.saturating_sub(self.last_sent) >= period,
        };
        if !due {
            return None;
        }
        self.last_bits = Some(bits);
        self.last_sent = now;
        Some(SpiFrame { bits, at: now })
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

impl<C: Clock> OutputEngine<C> {
    /// Run one cycle with the feedback delivered since the previous one.
    pub fn tick(&mut self, samples: &[FeedbackSample]) -> CycleReport {
        let now = self.clock.now();
        if self.phase == CyclePhase::Configuration {
            self.phase = CyclePhase::Cyclic;
            info!(
                "Configuration phase closed: {} channels configured",
                self.registry.configured_count()
            );
        }

        let mut report = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };

        for sample in samples {
            if self.registry.is_configured(sample.channel) {
                self.feedback[sample.channel as usize].store(
                    sample.kind,
                    sample.raw,
                    sample.fresh,
                    now,
                );
            } else {
                report.dropped_samples += 1;
            }
        }
        if report.dropped_samples > 0 {
            trace!("Cycle {}: dropped {} samples", self.cycle, report.dropped_samples);
        }

        for idx in 0..MAX_CHANNELS {
            let channel = idx as ChannelId;
            let Ok(cfg) = self.registry.output(channel).copied() else {
                continue;
            };
            let desc = &CHANNEL_TABLE[idx];
            let profile = *self.profile(desc.group);

            let previous = self.classifiers[idx].last();
            let result = self.classifiers[idx].classify(
                &profile,
                &self.feedback[idx],
                ClassifyInput {
                    commanded: cfg.commanded,
                    since_init: now.saturating_sub(cfg.initialised_at),
                    since_change: now.saturating_sub(cfg.last_change),
                    now,
                },
            );

            if cfg.diagnostic_enabled {
                if result.sample.tag != previous.tag {
                    debug!(
                        "Output {channel}: {:?} -> {:?} (raw={})",
                        previous.tag, result.sample.tag, result.sample.raw
                    );
                }
                let _ = report.diagnostics.push(ChannelDiagnostic {
                    channel,
                    sample: result.sample,
                });
            }

            if result.overcurrent && self.protection[idx].trip(now) {
                self.force_low(channel, now);
                warn!(
                    "Output {channel}: fatal overcurrent, tripped (raw={})",
                    result.sample.raw
                );
                let _ = report.trips.push(channel);
            }
        }

        for (idx, machine) in self.protection.iter_mut().enumerate() {
            if machine.observe(now) == Some(ProtectionState::Reenable) {
                info!("Output {idx}: re-enable wait elapsed, reset allowed");
                let _ = report.reenabled.push(idx as ChannelId);
            }
        }

        for latch in &mut self.feedback {
            latch.end_cycle();
        }

        let bits = self.spi_image();
        report.spi_frame = self.spi.poll(bits, now, self.config.spi_refresh());
        if let Some(frame) = report.spi_frame {
            trace!("SPI frame {:#010x}", frame.bits);
        }

        self.cycle += 1;
        report
    }

    /// Whether a configured output currently drives its load: commanded on,
    /// powered, not in safe state and not blocked by protection.
    pub fn is_driving(&self, channel: ChannelId) -> bool {
        let Ok(cfg) = self.registry.output(channel) else {
            return false;
        };
        let desc = &CHANNEL_TABLE[channel as usize];
        cfg.commanded
            && self.power.is_enabled(desc.shutoff_group)
            && !self.safe_state.covers(desc)
            && self.protection[channel as usize].state() == ProtectionState::Normal
    }

    /// Switch image of all outputs, one bit per channel id.
    pub fn output_bank(&self) -> OutputBank {
        let mut bank = OutputBank::new();
        for channel in self.registry.configured_outputs() {
            bank.set(channel, self.is_driving(channel));
        }
        bank
    }

    fn spi_image(&self) -> u32 {
        let variant = self.registry.variant();
        CHANNEL_TABLE
            .iter()
            .filter(|d| d.group == ChannelGroup::SpiMux && d.is_output() && d.available_on(variant))
            .enumerate()
            .fold(0u32, |bits, (pos, desc)| {
                if self.is_driving(desc.id) {
                    bits | (1 << pos)
                } else {
                    bits
                }
            })
    }
}
