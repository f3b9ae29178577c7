//! Shut-off group power status and application safe state.

use serde::{Deserialize, Serialize};

use dout_common::bank::OutputBank;
use dout_common::channel::{ChannelDescriptor, ChannelGroup, ChannelId};
use dout_common::consts::MAX_SHUTOFF_GROUPS;

/// Enable state of each shut-off group, as reported by the power
/// collaborator. All groups start disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStatus {
    enabled: [bool; MAX_SHUTOFF_GROUPS],
}

impl PowerStatus {
    pub const fn all_disabled() -> Self {
        Self {
            enabled: [false; MAX_SHUTOFF_GROUPS],
        }
    }

    pub const fn all_enabled() -> Self {
        Self {
            enabled: [true; MAX_SHUTOFF_GROUPS],
        }
    }

    pub const fn from_groups(enabled: [bool; MAX_SHUTOFF_GROUPS]) -> Self {
        Self { enabled }
    }

    /// Out-of-range groups are ignored.
    pub fn set(&mut self, group: u8, enabled: bool) {
        if let Some(slot) = self.enabled.get_mut(group as usize) {
            *slot = enabled;
        }
    }

    /// Unknown groups read as disabled.
    #[inline]
    pub fn is_enabled(&self, group: u8) -> bool {
        self.enabled.get(group as usize).copied().unwrap_or(false)
    }
}

/// What an application safe-state request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "id")]
pub enum SafeStateScope {
    All,
    Group(ChannelGroup),
    Channel(ChannelId),
}

/// Active safe-state requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafeStateMask {
    all: bool,
    groups: [bool; ChannelGroup::ALL.len()],
    channels: OutputBank,
}

impl SafeStateMask {
    pub const fn new() -> Self {
        Self {
            all: false,
            groups: [false; ChannelGroup::ALL.len()],
            channels: OutputBank::new(),
        }
    }

    pub fn enter(&mut self, scope: SafeStateScope) {
        self.apply(scope, true);
    }

    pub fn leave(&mut self, scope: SafeStateScope) {
        self.apply(scope, false);
    }

    fn apply(&mut self, scope: SafeStateScope, active: bool) {
        match scope {
            SafeStateScope::All => self.all = active,
            SafeStateScope::Group(group) => self.groups[group.index()] = active,
            SafeStateScope::Channel(id) => self.channels.set(id, active),
        }
    }

    /// Whether any active request covers `desc`.
    #[inline]
    pub fn covers(&self, desc: &ChannelDescriptor) -> bool {
        self.all || self.groups[desc.group.index()] || self.channels.get(desc.id)
    }

    pub fn is_clear(&self) -> bool {
        !self.all && !self.groups.iter().any(|g| *g) && self.channels.count_ones() == 0
    }
}
