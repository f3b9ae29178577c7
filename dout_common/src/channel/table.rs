//! Static channel table.
//!
//! | Ids    | Group     | Direction | Notes                                  |
//! |--------|-----------|-----------|----------------------------------------|
//! | 0–7    | `DirectA` | output    | 0, 1 safety-relevant (high side)       |
//! | 8–11   | `DirectB` | output    | 8, 9 safety-relevant (low side)        |
//! | 12–19  | `SpiMux`  | output    | 16–19 extended variant only            |
//! | 20–23  | `PwmAlt`  | output    | timer feedback                         |
//! | 24–27  | `DirectA` | input     | voltage feedback, configurable pull    |
//! | 28–29  | `SpiMux`  | input     | voltage feedback                       |
//! | 30–31  | `PwmAlt`  | input     | digital level only, extended variant   |

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::{MAX_CHANNELS, MAX_SHUTOFF_GROUPS};

/// Channel identifier, the index into [`CHANNEL_TABLE`].
pub type ChannelId = u8;

/// Power-stage technology a channel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChannelGroup {
    /// Direct-driven high-side switches.
    DirectA = 0,
    /// Direct-driven low-side switches.
    DirectB = 1,
    /// SPI shift-register multiplexed switches.
    SpiMux = 2,
    /// PWM alternate-function switches.
    PwmAlt = 3,
}

impl ChannelGroup {
    pub const ALL: [Self; 4] = [Self::DirectA, Self::DirectB, Self::SpiMux, Self::PwmAlt];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::DirectA),
            1 => Some(Self::DirectB),
            2 => Some(Self::SpiMux),
            3 => Some(Self::PwmAlt),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DirectA => "direct_a",
            Self::DirectB => "direct_b",
            Self::SpiMux => "spi_mux",
            Self::PwmAlt => "pwm_alt",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Fixed capability flags of a table entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelCaps: u16 {
        /// Channel drives a load.
        const OUTPUT           = 0x0001;
        /// Channel reads a level.
        const INPUT            = 0x0002;
        /// Output supports feedback diagnostics.
        const DIAGNOSTIC       = 0x0004;
        /// Output may be paired with a partner of opposite polarity.
        const SAFETY_LINK      = 0x0008;
        /// Output needs the global safety configuration.
        const SAFETY_RELEVANT  = 0x0010;
        /// Load current is sampled.
        const CURRENT_FEEDBACK = 0x0020;
        /// Pin voltage is sampled.
        const VOLTAGE_FEEDBACK = 0x0040;
        /// Input pull resistor is configurable.
        const PULL_CONFIG      = 0x0080;
    }
}

bitflags! {
    /// Hardware variants a table entry is populated on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VariantMask: u8 {
        const BASE     = 0x01;
        const EXTENDED = 0x02;
    }
}

/// Hardware variant selected at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HardwareVariant {
    Base,
    #[default]
    Extended,
}

impl HardwareVariant {
    #[inline]
    pub const fn mask(self) -> VariantMask {
        match self {
            Self::Base => VariantMask::BASE,
            Self::Extended => VariantMask::EXTENDED,
        }
    }
}

/// Input pull resistor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PullConfig {
    /// Hardware default (no software-selected pull).
    #[default]
    None,
    PullUp,
    PullDown,
}

/// One entry of the static channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub id: ChannelId,
    pub group: ChannelGroup,
    pub caps: ChannelCaps,
    /// Shut-off group supplied by the power collaborator.
    pub shutoff_group: u8,
    pub variants: VariantMask,
}

impl ChannelDescriptor {
    #[inline]
    pub const fn is_output(&self) -> bool {
        self.caps.contains(ChannelCaps::OUTPUT)
    }

    #[inline]
    pub const fn is_input(&self) -> bool {
        self.caps.contains(ChannelCaps::INPUT)
    }

    #[inline]
    pub const fn has(&self, caps: ChannelCaps) -> bool {
        self.caps.contains(caps)
    }

    #[inline]
    pub const fn available_on(&self, variant: HardwareVariant) -> bool {
        self.variants.intersects(variant.mask())
    }
}

const ALL_VARIANTS: VariantMask = VariantMask::all();
const EXTENDED_ONLY: VariantMask = VariantMask::EXTENDED;

const DIRECT_OUT: ChannelCaps = ChannelCaps::OUTPUT
    .union(ChannelCaps::DIAGNOSTIC)
    .union(ChannelCaps::CURRENT_FEEDBACK)
    .union(ChannelCaps::VOLTAGE_FEEDBACK);
const SAFETY_OUT: ChannelCaps = DIRECT_OUT
    .union(ChannelCaps::SAFETY_LINK)
    .union(ChannelCaps::SAFETY_RELEVANT);
const SPI_OUT: ChannelCaps = ChannelCaps::OUTPUT
    .union(ChannelCaps::DIAGNOSTIC)
    .union(ChannelCaps::VOLTAGE_FEEDBACK);
const PWM_OUT: ChannelCaps = ChannelCaps::OUTPUT
    .union(ChannelCaps::DIAGNOSTIC)
    .union(ChannelCaps::CURRENT_FEEDBACK);
const DIRECT_IN: ChannelCaps = ChannelCaps::INPUT
    .union(ChannelCaps::VOLTAGE_FEEDBACK)
    .union(ChannelCaps::PULL_CONFIG);
const SPI_IN: ChannelCaps = ChannelCaps::INPUT.union(ChannelCaps::VOLTAGE_FEEDBACK);
const PWM_IN: ChannelCaps = ChannelCaps::INPUT;

const fn entry(
    id: ChannelId,
    group: ChannelGroup,
    caps: ChannelCaps,
    shutoff_group: u8,
    variants: VariantMask,
) -> ChannelDescriptor {
    ChannelDescriptor {
        id,
        group,
        caps,
        shutoff_group,
        variants,
    }
}

use ChannelGroup::{DirectA, DirectB, PwmAlt, SpiMux};

/// The channel table, indexed by [`ChannelId`].
pub static CHANNEL_TABLE: [ChannelDescriptor; MAX_CHANNELS] = [
    entry(0, DirectA, SAFETY_OUT, 0, ALL_VARIANTS),
    entry(1, DirectA, SAFETY_OUT, 0, ALL_VARIANTS),
    entry(2, DirectA, DIRECT_OUT, 0, ALL_VARIANTS),
    entry(3, DirectA, DIRECT_OUT, 0, ALL_VARIANTS),
    entry(4, DirectA, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(5, DirectA, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(6, DirectA, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(7, DirectA, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(8, DirectB, SAFETY_OUT, 0, ALL_VARIANTS),
    entry(9, DirectB, SAFETY_OUT, 0, ALL_VARIANTS),
    entry(10, DirectB, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(11, DirectB, DIRECT_OUT, 1, ALL_VARIANTS),
    entry(12, SpiMux, SPI_OUT, 2, ALL_VARIANTS),
    entry(13, SpiMux, SPI_OUT, 2, ALL_VARIANTS),
    entry(14, SpiMux, SPI_OUT, 2, ALL_VARIANTS),
    entry(15, SpiMux, SPI_OUT, 2, ALL_VARIANTS),
    entry(16, SpiMux, SPI_OUT, 2, EXTENDED_ONLY),
    entry(17, SpiMux, SPI_OUT, 2, EXTENDED_ONLY),
    entry(18, SpiMux, SPI_OUT, 2, EXTENDED_ONLY),
    entry(19, SpiMux, SPI_OUT, 2, EXTENDED_ONLY),
    entry(20, PwmAlt, PWM_OUT, 3, ALL_VARIANTS),
    entry(21, PwmAlt, PWM_OUT, 3, ALL_VARIANTS),
    entry(22, PwmAlt, PWM_OUT, 3, ALL_VARIANTS),
    entry(23, PwmAlt, PWM_OUT, 3, ALL_VARIANTS),
    entry(24, DirectA, DIRECT_IN, 0, ALL_VARIANTS),
    entry(25, DirectA, DIRECT_IN, 0, ALL_VARIANTS),
    entry(26, DirectA, DIRECT_IN, 1, ALL_VARIANTS),
    entry(27, DirectA, DIRECT_IN, 1, ALL_VARIANTS),
    entry(28, SpiMux, SPI_IN, 2, ALL_VARIANTS),
    entry(29, SpiMux, SPI_IN, 2, ALL_VARIANTS),
    entry(30, PwmAlt, PWM_IN, 3, EXTENDED_ONLY),
    entry(31, PwmAlt, PWM_IN, 3, EXTENDED_ONLY),
];

// Every table index must be addressable by a `ChannelId`.
const_assert!(MAX_CHANNELS <= ChannelId::MAX as usize + 1);

/// Look up a table entry. Returns `None` for ids beyond the table.
#[inline]
pub fn lookup_descriptor(id: ChannelId) -> Option<&'static ChannelDescriptor> {
    CHANNEL_TABLE.get(id as usize)
}

/// Check the table: ids match positions, shut-off groups exist,
/// every entry is exactly one direction and safety-relevant outputs can link.
pub fn validate_table(table: &[ChannelDescriptor]) -> Result<(), String> {
    for (idx, desc) in table.iter().enumerate() {
        if desc.id as usize != idx {
            return Err(format!("entry {idx} carries id {}", desc.id));
        }
        if desc.shutoff_group as usize >= MAX_SHUTOFF_GROUPS {
            return Err(format!(
                "channel {} references shut-off group {}",
                desc.id, desc.shutoff_group
            ));
        }
        if desc.is_output() == desc.is_input() {
            return Err(format!("channel {} must be exactly one direction", desc.id));
        }
        if desc.has(ChannelCaps::SAFETY_RELEVANT) && !desc.has(ChannelCaps::SAFETY_LINK) {
            return Err(format!("channel {} is safety-relevant without link", desc.id));
        }
        if desc.has(ChannelCaps::SAFETY_LINK) && !desc.has(ChannelCaps::DIAGNOSTIC) {
            return Err(format!("channel {} links without diagnostics", desc.id));
        }
        if desc.variants.is_empty() {
            return Err(format!("channel {} exists on no variant", desc.id));
        }
    }
    Ok(())
}
