//! Latched raw feedback per channel.
//!
//! The acquisition side delivers [`FeedbackSample`]s; each channel keeps the
//! most recent value of every signal kind together with two freshness
//! marks: one consumed by the classifier at the end of each cycle, one
//! consumed by the first application read.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use dout_common::channel::ChannelId;

/// Signal kind of a feedback sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Load current [mA].
    Current,
    /// Pin voltage [mV].
    Voltage,
    /// Digital level or stage status bit (0 / non-zero).
    Digital,
}

impl FeedbackKind {
    const COUNT: usize = 3;

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Current => 0,
            Self::Voltage => 1,
            Self::Digital => 2,
        }
    }
}

/// One raw sample from the acquisition collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSample {
    pub channel: ChannelId,
    pub kind: FeedbackKind,
    pub raw: u16,
    /// `false` when the acquisition side repeats an old conversion.
    #[serde(default = "default_fresh")]
    pub fresh: bool,
}

fn default_fresh() -> bool {
    true
}

impl FeedbackSample {
    pub const fn new(channel: ChannelId, kind: FeedbackKind, raw: u16) -> Self {
        Self {
            channel,
            kind,
            raw,
            fresh: true,
        }
    }

    pub const fn current(channel: ChannelId, milliamps: u16) -> Self {
        Self::new(channel, FeedbackKind::Current, milliamps)
    }

    pub const fn voltage(channel: ChannelId, millivolts: u16) -> Self {
        Self::new(channel, FeedbackKind::Voltage, millivolts)
    }

    pub const fn digital(channel: ChannelId, level: bool) -> Self {
        Self::new(channel, FeedbackKind::Digital, level as u16)
    }

    /// Mark as a repeated, non-fresh conversion.
    pub const fn stale(mut self) -> Self {
        self.fresh = false;
        self
    }
}

/// Application view of a latched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reading {
    pub raw: u16,
    /// A fresh sample arrived since the previous read.
    pub fresh: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    raw: u16,
    at: Duration,
    valid: bool,
    /// Fresh since the last classification cycle.
    pending: bool,
    /// Fresh since the last application read.
    unread: bool,
}

/// Latched feedback of one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackLatch {
    slots: [Slot; FeedbackKind::COUNT],
}

impl FeedbackLatch {
    pub const fn new() -> Self {
        const EMPTY: Slot = Slot {
            raw: 0,
            at: Duration::ZERO,
            valid: false,
            pending: false,
            unread: false,
        };
        Self {
            slots: [EMPTY; FeedbackKind::COUNT],
        }
    }

    /// Latch a sample. A non-fresh sample updates the value only.
    pub fn store(&mut self, kind: FeedbackKind, raw: u16, fresh: bool, now: Duration) {
        let slot = &mut self.slots[kind.index()];
        slot.raw = raw;
        slot.valid = true;
        if fresh {
            slot.at = now;
            slot.pending = true;
            slot.unread = true;
        }
    }

    /// Most recent value, if any sample ever arrived.
    #[inline]
    pub fn latest(&self, kind: FeedbackKind) -> Option<u16> {
        let slot = &self.slots[kind.index()];
        slot.valid.then_some(slot.raw)
    }

    /// Value if a fresh sample arrived during the current cycle.
    #[inline]
    pub fn pending(&self, kind: FeedbackKind) -> Option<u16> {
        let slot = &self.slots[kind.index()];
        slot.pending.then_some(slot.raw)
    }

    /// Time of the most recent fresh sample.
    #[inline]
    pub fn sampled_at(&self, kind: FeedbackKind) -> Option<Duration> {
        let slot = &self.slots[kind.index()];
        slot.valid.then_some(slot.at)
    }

    /// Application read. The first read after a fresh sample reports
    /// `fresh = true`; later reads of the same sample do not.
    pub fn read(&mut self, kind: FeedbackKind) -> Reading {
        let slot = &mut self.slots[kind.index()];
        let reading = Reading {
            raw: slot.raw,
            fresh: slot.unread,
        };
        slot.unread = false;
        reading
    }

    /// Close the classification cycle.
    pub fn end_cycle(&mut self) {
        for slot in &mut self.slots {
            slot.pending = false;
        }
    }

    /// Forget everything (channel deinitialised).
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
