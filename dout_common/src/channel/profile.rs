//! Per-group hardware profiles.
//!
//! Thresholds and windows here are hardware-measured facts of each power
//! stage. The engine consumes them as configuration; it never derives them.
//! Defaults match the reference hardware and can be overridden per group in
//! the `[groups.<name>]` TOML tables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::table::ChannelGroup;
use crate::consts::{SETTLE_MS_MAX, STARTUP_MS_MAX, WAIT_MS_MAX, WAIT_MS_MIN};
use crate::state::DiagnosticTag;

/// Switch polarity of a power stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPolarity {
    /// Switches the load to battery.
    HighSide,
    /// Switches the load to ground.
    LowSide,
}

impl SwitchPolarity {
    /// Tag for excessive on-state current.
    #[inline]
    pub const fn on_short_tag(self) -> DiagnosticTag {
        match self {
            Self::HighSide => DiagnosticTag::ShortGround,
            Self::LowSide => DiagnosticTag::ShortBattery,
        }
    }

    /// Physical pin level for a logical command.
    #[inline]
    pub const fn pin_level(self, commanded: bool) -> bool {
        match self {
            Self::HighSide => commanded,
            Self::LowSide => !commanded,
        }
    }
}

/// Which feedback signal the stage delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    /// Analog current (on) and voltage (off) sense.
    Analog,
    /// Stage status bit (set = autonomous shutoff) plus off-state voltage.
    StageStatus,
    /// Timer-captured pin level plus analog current.
    DigitalTimer,
}

/// Fatal-overcurrent qualification condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum OvercurrentRule {
    /// Current above `threshold_ma` continuously for `window_ms`.
    Sustained { threshold_ma: u16, window_ms: u32 },
    /// `samples` consecutive fresh samples above `ceiling_ma`.
    Ceiling { ceiling_ma: u16, samples: u8 },
    /// The stage reports its own shutoff.
    StageShutoff,
}

/// Diagnostic and protection constants for one channel group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupProfile {
    pub polarity: SwitchPolarity,
    pub feedback: FeedbackSource,
    /// Tripped → Reenable wait [ms].
    pub wait_ms: u32,
    /// Classification suppressed this long after a level change [ms].
    pub settle_ms: u32,
    /// `Set` answers `Startup` this long after init [ms].
    pub startup_ms: u32,
    /// On-state current below this is an open load [mA]. 0 disables.
    pub open_load_ma: u16,
    /// On-state current above this is a short [mA]. 0 disables.
    pub short_ma: u16,
    /// Off-state voltage threshold [mV]: above it for high side, below it
    /// for low side. 0 disables.
    pub off_fault_mv: u16,
    /// Off-state fault cannot be told apart from an open load.
    #[serde(default)]
    pub ambiguous_off_state: bool,
    pub overcurrent: OvercurrentRule,
}

impl GroupProfile {
    /// Direct-driven high-side stage.
    pub const DIRECT_A: Self = Self {
        polarity: SwitchPolarity::HighSide,
        feedback: FeedbackSource::Analog,
        wait_ms: 1000,
        settle_ms: 10,
        startup_ms: 0,
        open_load_ma: 20,
        short_ma: 2500,
        off_fault_mv: 4000,
        ambiguous_off_state: false,
        overcurrent: OvercurrentRule::Sustained {
            threshold_ma: 3000,
            window_ms: 100,
        },
    };

    /// Direct-driven low-side stage.
    pub const DIRECT_B: Self = Self {
        polarity: SwitchPolarity::LowSide,
        feedback: FeedbackSource::Analog,
        wait_ms: 1000,
        settle_ms: 10,
        startup_ms: 0,
        open_load_ma: 20,
        short_ma: 3000,
        off_fault_mv: 1000,
        ambiguous_off_state: false,
        overcurrent: OvercurrentRule::Ceiling {
            ceiling_ma: 6000,
            samples: 3,
        },
    };

    /// SPI shift-register stage with autonomous shutoff.
    pub const SPI_MUX: Self = Self {
        polarity: SwitchPolarity::HighSide,
        feedback: FeedbackSource::StageStatus,
        wait_ms: 10_000,
        settle_ms: 20,
        startup_ms: 20,
        open_load_ma: 0,
        short_ma: 0,
        off_fault_mv: 3000,
        ambiguous_off_state: true,
        overcurrent: OvercurrentRule::StageShutoff,
    };

    /// PWM alternate-function stage with timer feedback.
    pub const PWM_ALT: Self = Self {
        polarity: SwitchPolarity::HighSide,
        feedback: FeedbackSource::DigitalTimer,
        wait_ms: 1000,
        settle_ms: 10,
        startup_ms: 5,
        open_load_ma: 10,
        short_ma: 2000,
        off_fault_mv: 0,
        ambiguous_off_state: false,
        overcurrent: OvercurrentRule::Sustained {
            threshold_ma: 2500,
            window_ms: 100,
        },
    };

    #[inline]
    pub const fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_ms as u64)
    }

    #[inline]
    pub const fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_ms as u64)
    }

    #[inline]
    pub const fn startup_time(&self) -> Duration {
        Duration::from_millis(self.startup_ms as u64)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_ms < WAIT_MS_MIN || self.wait_ms > WAIT_MS_MAX {
            return Err(format!(
                "wait_ms {} out of range [{}, {}]",
                self.wait_ms, WAIT_MS_MIN, WAIT_MS_MAX
            ));
        }
        if self.settle_ms > SETTLE_MS_MAX {
            return Err(format!(
                "settle_ms {} exceeds {}",
                self.settle_ms, SETTLE_MS_MAX
            ));
        }
        if self.startup_ms > STARTUP_MS_MAX {
            return Err(format!(
                "startup_ms {} exceeds {}",
                self.startup_ms, STARTUP_MS_MAX
            ));
        }
        if self.short_ma != 0 && self.open_load_ma >= self.short_ma {
            return Err(format!(
                "open_load_ma {} must be below short_ma {}",
                self.open_load_ma, self.short_ma
            ));
        }
        match self.overcurrent {
            OvercurrentRule::Sustained {
                threshold_ma,
                window_ms,
            } => {
                if threshold_ma == 0 || window_ms == 0 {
                    return Err("sustained rule needs threshold_ma and window_ms > 0".into());
                }
            }
            OvercurrentRule::Ceiling {
                ceiling_ma,
                samples,
            } => {
                if ceiling_ma == 0 || samples == 0 {
                    return Err("ceiling rule needs ceiling_ma and samples > 0".into());
                }
            }
            OvercurrentRule::StageShutoff => {
                if self.feedback != FeedbackSource::StageStatus {
                    return Err("stage_shutoff rule needs stage_status feedback".into());
                }
            }
        }
        Ok(())
    }
}

/// Profiles of all four groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupProfiles {
    #[serde(default = "default_direct_a")]
    pub direct_a: GroupProfile,
    #[serde(default = "default_direct_b")]
    pub direct_b: GroupProfile,
    #[serde(default = "default_spi_mux")]
    pub spi_mux: GroupProfile,
    #[serde(default = "default_pwm_alt")]
    pub pwm_alt: GroupProfile,
}

fn default_direct_a() -> GroupProfile {
    GroupProfile::DIRECT_A
}
fn default_direct_b() -> GroupProfile {
    GroupProfile::DIRECT_B
}
fn default_spi_mux() -> GroupProfile {
    GroupProfile::SPI_MUX
}
fn default_pwm_alt() -> GroupProfile {
    GroupProfile::PWM_ALT
}

impl Default for GroupProfiles {
    fn default() -> Self {
        Self {
            direct_a: GroupProfile::DIRECT_A,
            direct_b: GroupProfile::DIRECT_B,
            spi_mux: GroupProfile::SPI_MUX,
            pwm_alt: GroupProfile::PWM_ALT,
        }
    }
}

impl GroupProfiles {
    #[inline]
    pub const fn get(&self, group: ChannelGroup) -> &GroupProfile {
        match group {
            ChannelGroup::DirectA => &self.direct_a,
            ChannelGroup::DirectB => &self.direct_b,
            ChannelGroup::SpiMux => &self.spi_mux,
            ChannelGroup::PwmAlt => &self.pwm_alt,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, group: ChannelGroup) -> &mut GroupProfile {
        match group {
            ChannelGroup::DirectA => &mut self.direct_a,
            ChannelGroup::DirectB => &mut self.direct_b,
            ChannelGroup::SpiMux => &mut self.spi_mux,
            ChannelGroup::PwmAlt => &mut self.pwm_alt,
        }
    }

    /// Validate every group, prefixing errors with the group name.
    pub fn validate(&self) -> Result<(), String> {
        for group in ChannelGroup::ALL {
            self.get(group)
                .validate()
                .map_err(|e| format!("groups.{group}: {e}"))?;
        }
        Ok(())
    }
}
