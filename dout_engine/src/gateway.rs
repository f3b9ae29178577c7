//! Output command gateway: the application's set/get surface.
//!
//! `set` checks, in order: channel id, direction, configuration, startup
//! window, shut-off group power, safe state and protection state. Only a
//! command that passes all of them changes the commanded level.

use tracing::debug;

use dout_common::channel::{ChannelCaps, ChannelId};
use dout_common::error::DoutError;

use crate::clock::Clock;
use crate::diagnostic::DiagnosticSample;
use crate::engine::OutputEngine;
use crate::feedback::{FeedbackKind, Reading};
use crate::registry::Direction;

/// Outcome of an accepted `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Accepted,
    /// Accepted; carries the channel's latest diagnostic finding.
    Advisory(DoutError),
}

impl SetOutcome {
    #[inline]
    pub const fn advisory(&self) -> Option<DoutError> {
        match self {
            Self::Accepted => None,
            Self::Advisory(e) => Some(*e),
        }
    }
}

impl<C: Clock> OutputEngine<C> {
    /// Command an output level.
    ///
    /// Rejections carry the blocking condition. A rejection caused by a
    /// disabled shut-off group or a safe state also commands the output low.
    /// On acceptance the latest diagnostic of the output is attached as an
    /// advisory.
    pub fn set(&mut self, channel: ChannelId, value: bool) -> Result<SetOutcome, DoutError> {
        let desc = self.registry.require(channel, Direction::Output)?;
        let cfg = *self.registry.output(channel)?;
        let now = self.clock.now();
        let idx = channel as usize;

        let startup = self.profile(desc.group).startup_time();
        if now.saturating_sub(cfg.initialised_at) < startup {
            return Err(DoutError::Startup);
        }
        if !self.power.is_enabled(desc.shutoff_group) {
            self.force_low(channel, now);
            return Err(DoutError::SafetySwitchDisabled);
        }
        if self.safe_state.covers(desc) {
            self.force_low(channel, now);
            return Err(DoutError::SafeState);
        }
        let machine = &mut self.protection[idx];
        machine.observe(now);
        if let Some(blocked) = machine.state().blocking_error() {
            return Err(blocked);
        }

        let outcome = if !cfg.diagnostic_enabled {
            SetOutcome::Advisory(DoutError::NoDiagnosticAvailable)
        } else {
            match self.classifiers[idx].last().tag.advisory() {
                Some(finding) => SetOutcome::Advisory(finding),
                None => SetOutcome::Accepted,
            }
        };

        if let Ok(out) = self.registry.output_mut(channel)
            && out.command(value, now)
        {
            self.classifiers[idx].level_changed();
            debug!("Output {channel} commanded {}", if value { "on" } else { "off" });
        }
        Ok(outcome)
    }

    /// Commanded level of a configured output.
    pub fn get_output(&mut self, channel: ChannelId) -> Result<bool, DoutError> {
        self.registry.require(channel, Direction::Output)?;
        let commanded = self.registry.output(channel)?.commanded;
        let now = self.clock.now();
        self.protection[channel as usize].observe(now);
        Ok(commanded)
    }

    /// Latched load current [mA]. The first read after a new sample
    /// reports it as fresh.
    pub fn get_current(&mut self, channel: ChannelId) -> Result<Reading, DoutError> {
        self.registry
            .require_configured(channel, ChannelCaps::CURRENT_FEEDBACK)?;
        Ok(self.feedback[channel as usize].read(FeedbackKind::Current))
    }

    /// Latched pin voltage [mV]. Freshness as for [`get_current`](Self::get_current).
    pub fn get_voltage(&mut self, channel: ChannelId) -> Result<Reading, DoutError> {
        self.registry
            .require_configured(channel, ChannelCaps::VOLTAGE_FEEDBACK)?;
        Ok(self.feedback[channel as usize].read(FeedbackKind::Voltage))
    }

    /// Logical level of a configured input.
    ///
    /// Inputs with voltage feedback are classified against their voltage
    /// bands; others report the latched digital level.
    pub fn get_input(&mut self, channel: ChannelId) -> Result<bool, DoutError> {
        let desc = self.registry.require(channel, Direction::Input)?;
        let limits = self.registry.input(channel)?.limits;
        let latch = &mut self.feedback[channel as usize];

        if desc.has(ChannelCaps::VOLTAGE_FEEDBACK) {
            let Some(millivolts) = latch.latest(FeedbackKind::Voltage) else {
                return Err(DoutError::NoDiagnosticAvailable);
            };
            latch.read(FeedbackKind::Voltage);
            limits.classify(millivolts)
        } else {
            let level = latch
                .latest(FeedbackKind::Digital)
                .ok_or(DoutError::NoDiagnosticAvailable)?;
            latch.read(FeedbackKind::Digital);
            Ok(level != 0)
        }
    }

    /// Latest diagnostic of a configured output. Outputs without
    /// diagnostics always report `NoDiagnosticAvailable`.
    pub fn diagnostic(&self, channel: ChannelId) -> Result<DiagnosticSample, DoutError> {
        self.registry.require(channel, Direction::Output)?;
        let cfg = self.registry.output(channel)?;
        if !cfg.diagnostic_enabled {
            return Ok(DiagnosticSample::UNAVAILABLE);
        }
        Ok(self.classifiers[channel as usize].last())
    }
}
