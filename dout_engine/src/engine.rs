//! The output engine: channel lifecycle, protection access and the
//! shared runtime state used by the command gateway and the cycle driver.
//!
//! All per-channel state lives in fixed arrays indexed by [`ChannelId`];
//! nothing allocates after [`OutputEngine::new`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use dout_common::channel::{
    CHANNEL_TABLE, ChannelCaps, ChannelGroup, ChannelId, GroupProfile, PullConfig,
};
use dout_common::config::{ConfigError, EngineConfig};
use dout_common::consts::{MAX_CHANNELS, MAX_SHUTOFF_GROUPS};
use dout_common::error::DoutError;
use dout_common::state::{CyclePhase, ProtectionState};

use crate::clock::{Clock, MonotonicClock};
use crate::cycle::SpiRefresh;
use crate::diagnostic::ChannelClassifier;
use crate::feedback::FeedbackLatch;
use crate::limits::VoltageLimits;
use crate::power::{PowerStatus, SafeStateMask, SafeStateScope};
use crate::protection::ProtectionMachine;
use crate::registry::{ChannelConfig, ChannelRegistry, Direction, InputConfig, OutputConfig};
use crate::safety_link::{SafetyLinkConfig, SafetyLinkResolver};

/// Parameters of an output initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputInit {
    /// Publish diagnostics for this output. Forced on by a safety link.
    #[serde(default)]
    pub diagnostic: bool,
    #[serde(default)]
    pub safety_link: Option<SafetyLinkConfig>,
}

impl OutputInit {
    pub const fn with_diagnostics() -> Self {
        Self {
            diagnostic: true,
            safety_link: None,
        }
    }

    pub const fn linked(partner: ChannelId) -> Self {
        Self {
            diagnostic: false,
            safety_link: Some(SafetyLinkConfig { partner }),
        }
    }
}

/// Protection state snapshot of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionStatus {
    pub state: ProtectionState,
    pub reset_count: u8,
}

/// Digital output protection engine.
pub struct OutputEngine<C: Clock = MonotonicClock> {
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
    pub(crate) phase: CyclePhase,
    pub(crate) registry: ChannelRegistry,
    pub(crate) links: SafetyLinkResolver,
    pub(crate) protection: [ProtectionMachine; MAX_CHANNELS],
    pub(crate) classifiers: [ChannelClassifier; MAX_CHANNELS],
    pub(crate) feedback: [FeedbackLatch; MAX_CHANNELS],
    pub(crate) power: PowerStatus,
    pub(crate) safe_state: SafeStateMask,
    pub(crate) spi: SpiRefresh,
    pub(crate) cycle: u64,
}

impl<C: Clock> OutputEngine<C> {
    /// Build an engine from a configuration. Fails if the configuration
    /// does not validate.
    pub fn new(config: EngineConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        let protection = std::array::from_fn(|idx| {
            ProtectionMachine::new(config.groups.get(CHANNEL_TABLE[idx].group).wait_time())
        });

        info!(
            "Output engine ready: variant={:?}, cycle={}ms, spi_refresh={}ms, safety={}",
            config.variant,
            config.cycle_time_ms,
            config.spi_refresh_ms,
            if config.safety.is_some() { "present" } else { "absent" },
        );

        Ok(Self {
            clock,
            registry: ChannelRegistry::new(config.variant),
            links: SafetyLinkResolver::new(),
            protection,
            classifiers: [ChannelClassifier::new(); MAX_CHANNELS],
            feedback: [FeedbackLatch::new(); MAX_CHANNELS],
            power: PowerStatus::all_disabled(),
            safe_state: SafeStateMask::new(),
            spi: SpiRefresh::new(),
            cycle: 0,
            phase: CyclePhase::Configuration,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Completed cycles.
    #[inline]
    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    #[inline]
    pub fn is_configured(&self, channel: ChannelId) -> bool {
        self.registry.is_configured(channel)
    }

    pub(crate) fn profile(&self, group: ChannelGroup) -> &GroupProfile {
        self.config.groups.get(group)
    }

    fn ensure_config_phase(&self) -> Result<(), DoutError> {
        match self.phase {
            CyclePhase::Configuration => Ok(()),
            CyclePhase::Cyclic => Err(DoutError::ConfigPhaseClosed),
        }
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Configure an input. `limits = None` selects the default voltage bands.
    /// Allowed in any phase.
    pub fn init_input(
        &mut self,
        channel: ChannelId,
        pull: PullConfig,
        limits: Option<VoltageLimits>,
    ) -> Result<(), DoutError> {
        self.registry.prepare_input(channel, pull)?;
        let limits = VoltageLimits::resolve(limits)?;

        let now = self.clock.now();
        self.registry.insert(
            channel,
            ChannelConfig::Input(InputConfig {
                pull,
                limits,
                initialised_at: now,
            }),
        );
        self.feedback[channel as usize].clear();
        info!("Input {channel} configured: pull={pull:?}, limits={limits:?}");
        Ok(())
    }

    /// Configure an output. The output starts commanded low.
    pub fn init_output(&mut self, channel: ChannelId, init: OutputInit) -> Result<(), DoutError> {
        let desc = self.registry.prepare_output(channel)?;
        self.ensure_config_phase()?;
        let partner = self.links.resolve(
            &self.registry,
            &self.config.groups,
            self.config.safety.as_ref(),
            desc,
            init.safety_link.as_ref(),
        )?;
        let diagnostic = init.diagnostic || partner.is_some();
        if diagnostic && !desc.has(ChannelCaps::DIAGNOSTIC) {
            return Err(DoutError::InvalidParameter);
        }

        let now = self.clock.now();
        self.registry.insert(
            channel,
            ChannelConfig::Output(OutputConfig::new(diagnostic, partner, now)),
        );
        if let Some(partner) = partner {
            self.links.record(channel, partner);
        }
        let idx = channel as usize;
        self.classifiers[idx].level_changed();
        self.feedback[idx].clear();

        let state = self.protection[idx].state();
        if state == ProtectionState::Permanent {
            warn!("Output {channel} configured while protection is permanently latched");
        }
        info!(
            "Output {channel} configured: group={}, diagnostics={diagnostic}, partner={partner:?}",
            desc.group
        );
        Ok(())
    }

    /// Remove an input configuration.
    pub fn deinit_input(&mut self, channel: ChannelId) -> Result<(), DoutError> {
        self.registry.remove(channel, Direction::Input)?;
        self.feedback[channel as usize].clear();
        info!("Input {channel} deinitialised");
        Ok(())
    }

    /// Remove an output configuration, its safety link and any pending trip.
    pub fn deinit_output(&mut self, channel: ChannelId) -> Result<(), DoutError> {
        self.registry.remove(channel, Direction::Output)?;
        let idx = channel as usize;
        if let Some(partner) = self.links.release(channel) {
            debug!("Output {channel}: safety link to {partner} removed");
        }
        self.protection[idx].release();
        self.classifiers[idx].level_changed();
        self.feedback[idx].clear();
        info!("Output {channel} deinitialised");
        Ok(())
    }

    /// Whether a configured output publishes diagnostics.
    pub fn diagnostics_enabled(&self, channel: ChannelId) -> Result<bool, DoutError> {
        self.registry.require(channel, Direction::Output)?;
        Ok(self.registry.output(channel)?.diagnostic_enabled)
    }

    /// Opposite-polarity partner of a linked output.
    pub fn safety_partner(&self, channel: ChannelId) -> Option<ChannelId> {
        self.links.partner_of(channel)
    }

    // ─── Protection ─────────────────────────────────────────────────

    /// Current protection state, after evaluating the re-enable timer.
    pub fn protection_status(&mut self, channel: ChannelId) -> Result<ProtectionStatus, DoutError> {
        self.registry.require(channel, Direction::Output)?;
        let now = self.clock.now();
        let machine = &mut self.protection[channel as usize];
        machine.observe(now);
        Ok(ProtectionStatus {
            state: machine.state(),
            reset_count: machine.reset_count(),
        })
    }

    /// Acknowledge a trip. Legal only in `Reenable`; returns the updated
    /// session reset counter. The output stays low until commanded again.
    pub fn reset_protection(&mut self, channel: ChannelId) -> Result<u8, DoutError> {
        self.registry.require(channel, Direction::Output)?;
        self.registry.output(channel)?;
        let now = self.clock.now();
        let result = self.protection[channel as usize].reset(now);
        match result {
            Ok(count) => info!("Output {channel}: protection reset ({count} this session)"),
            Err(DoutError::FetProtectionPermanent) => {
                warn!("Output {channel}: protection permanently latched")
            }
            Err(e) => debug!("Output {channel}: protection reset refused: {e}"),
        }
        result
    }

    // ─── Power & Safe State ─────────────────────────────────────────

    /// Latest shut-off group status. Outputs in a disabled group are
    /// commanded low.
    pub fn apply_power_status(&mut self, status: PowerStatus) {
        let now = self.clock.now();
        for desc in CHANNEL_TABLE.iter() {
            if !status.is_enabled(desc.shutoff_group) {
                self.force_low(desc.id, now);
            }
        }
        for group in 0..MAX_SHUTOFF_GROUPS as u8 {
            let (was, is) = (self.power.is_enabled(group), status.is_enabled(group));
            if was != is {
                info!("Shut-off group {group} {}", if is { "enabled" } else { "disabled" });
            }
        }
        self.power = status;
    }

    #[inline]
    pub fn power_status(&self) -> PowerStatus {
        self.power
    }

    /// Enter an application safe state. Covered outputs are commanded low
    /// and refuse commands until the state is left.
    pub fn enter_safe_state(&mut self, scope: SafeStateScope) {
        self.safe_state.enter(scope);
        let now = self.clock.now();
        for desc in CHANNEL_TABLE.iter() {
            if self.safe_state.covers(desc) {
                self.force_low(desc.id, now);
            }
        }
        info!("Safe state entered: {scope:?}");
    }

    pub fn leave_safe_state(&mut self, scope: SafeStateScope) {
        self.safe_state.leave(scope);
        info!("Safe state left: {scope:?}");
    }

    /// Command a configured output low. No-op for anything else.
    pub(crate) fn force_low(&mut self, channel: ChannelId, now: Duration) {
        if let Ok(cfg) = self.registry.output_mut(channel)
            && cfg.command(false, now)
        {
            self.classifiers[channel as usize].level_changed();
        }
    }
}
