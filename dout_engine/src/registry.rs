//! Channel registry: per-channel configuration slots.
//!
//! All validation happens in the `prepare_*` methods before anything is
//! written, so a failed initialisation leaves the registry untouched.

use std::time::Duration;

use dout_common::channel::{
    ChannelCaps, ChannelDescriptor, ChannelId, HardwareVariant, PullConfig, lookup_descriptor,
};
use dout_common::consts::MAX_CHANNELS;
use dout_common::error::DoutError;

use crate::limits::VoltageLimits;

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    const fn capability(self) -> ChannelCaps {
        match self {
            Self::Input => ChannelCaps::INPUT,
            Self::Output => ChannelCaps::OUTPUT,
        }
    }
}

/// Stored configuration of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    pub pull: PullConfig,
    pub limits: VoltageLimits,
    pub initialised_at: Duration,
}

/// Stored configuration and command state of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub diagnostic_enabled: bool,
    pub safety_partner: Option<ChannelId>,
    pub commanded: bool,
    /// Time of the last commanded level change.
    pub last_change: Duration,
    pub initialised_at: Duration,
}

impl OutputConfig {
    /// New output, commanded low.
    pub const fn new(diagnostic_enabled: bool, safety_partner: Option<ChannelId>, now: Duration) -> Self {
        Self {
            diagnostic_enabled,
            safety_partner,
            commanded: false,
            last_change: now,
            initialised_at: now,
        }
    }

    /// Record a commanded level. Returns `true` if the level changed.
    pub fn command(&mut self, value: bool, now: Duration) -> bool {
        if self.commanded == value {
            return false;
        }
        self.commanded = value;
        self.last_change = now;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelConfig {
    Input(InputConfig),
    Output(OutputConfig),
}

impl ChannelConfig {
    pub const fn direction(&self) -> Direction {
        match self {
            Self::Input(_) => Direction::Input,
            Self::Output(_) => Direction::Output,
        }
    }
}

/// Configuration slots indexed by channel id.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    variant: HardwareVariant,
    slots: [Option<ChannelConfig>; MAX_CHANNELS],
}

impl ChannelRegistry {
    pub const fn new(variant: HardwareVariant) -> Self {
        Self {
            variant,
            slots: [None; MAX_CHANNELS],
        }
    }

    #[inline]
    pub const fn variant(&self) -> HardwareVariant {
        self.variant
    }

    /// Table entry of a channel populated on the active variant.
    pub fn descriptor(&self, id: ChannelId) -> Result<&'static ChannelDescriptor, DoutError> {
        lookup_descriptor(id)
            .filter(|desc| desc.available_on(self.variant))
            .ok_or(DoutError::InvalidChannelId)
    }

    /// Descriptor of a channel that supports `direction`.
    pub fn require(
        &self,
        id: ChannelId,
        direction: Direction,
    ) -> Result<&'static ChannelDescriptor, DoutError> {
        let desc = self.descriptor(id)?;
        if !desc.has(direction.capability()) {
            return Err(DoutError::CapabilityMismatch);
        }
        Ok(desc)
    }

    /// Descriptor for a channel that has `caps` and is configured.
    pub fn require_configured(
        &self,
        id: ChannelId,
        caps: ChannelCaps,
    ) -> Result<&'static ChannelDescriptor, DoutError> {
        let desc = self.descriptor(id)?;
        if !desc.has(caps) {
            return Err(DoutError::CapabilityMismatch);
        }
        if !self.is_configured(id) {
            return Err(DoutError::NotConfigured);
        }
        Ok(desc)
    }

    /// Validate an input initialisation without writing it.
    pub fn prepare_input(
        &self,
        id: ChannelId,
        pull: PullConfig,
    ) -> Result<&'static ChannelDescriptor, DoutError> {
        let desc = self.require(id, Direction::Input)?;
        self.check_free(id)?;
        if pull != PullConfig::None && !desc.has(ChannelCaps::PULL_CONFIG) {
            return Err(DoutError::InvalidParameter);
        }
        Ok(desc)
    }

    /// Validate an output initialisation without writing it.
    pub fn prepare_output(&self, id: ChannelId) -> Result<&'static ChannelDescriptor, DoutError> {
        let desc = self.require(id, Direction::Output)?;
        self.check_free(id)?;
        Ok(desc)
    }

    fn check_free(&self, id: ChannelId) -> Result<(), DoutError> {
        if self.is_configured(id) {
            Err(DoutError::ChannelBusy)
        } else {
            Ok(())
        }
    }

    /// Commit a validated configuration.
    pub fn insert(&mut self, id: ChannelId, config: ChannelConfig) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(config);
        }
    }

    /// Remove a configuration of the given direction.
    pub fn remove(&mut self, id: ChannelId, direction: Direction) -> Result<ChannelConfig, DoutError> {
        self.require(id, direction)?;
        self.slots[id as usize]
            .take()
            .ok_or(DoutError::NotConfigured)
    }

    #[inline]
    pub fn is_configured(&self, id: ChannelId) -> bool {
        matches!(self.slots.get(id as usize), Some(Some(_)))
    }

    pub fn get(&self, id: ChannelId) -> Option<&ChannelConfig> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    pub fn input(&self, id: ChannelId) -> Result<&InputConfig, DoutError> {
        match self.get(id) {
            Some(ChannelConfig::Input(cfg)) => Ok(cfg),
            Some(ChannelConfig::Output(_)) => Err(DoutError::CapabilityMismatch),
            None => Err(DoutError::NotConfigured),
        }
    }

    pub fn output(&self, id: ChannelId) -> Result<&OutputConfig, DoutError> {
        match self.get(id) {
            Some(ChannelConfig::Output(cfg)) => Ok(cfg),
            Some(ChannelConfig::Input(_)) => Err(DoutError::CapabilityMismatch),
            None => Err(DoutError::NotConfigured),
        }
    }

    pub fn output_mut(&mut self, id: ChannelId) -> Result<&mut OutputConfig, DoutError> {
        match self.slots.get_mut(id as usize).and_then(Option::as_mut) {
            Some(ChannelConfig::Output(cfg)) => Ok(cfg),
            Some(ChannelConfig::Input(_)) => Err(DoutError::CapabilityMismatch),
            None => Err(DoutError::NotConfigured),
        }
    }

    /// Ids of configured outputs, ascending.
    pub fn configured_outputs(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Some(ChannelConfig::Output(_))))
            .map(|(idx, _)| idx as ChannelId)
    }

    pub fn configured_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
