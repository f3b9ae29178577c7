//! Protection and diagnostic enums.
//!
//! All enums use `#[repr(u8)]` for compact tables and carry `from_u8` for
//! transport to diagnostic tooling.

use serde::{Deserialize, Serialize};

use crate::error::DoutError;

/// Per-output overcurrent protection state.
///
/// `Permanent` is terminal for the power-on session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ProtectionState {
    /// Output follows the commanded level.
    #[default]
    Normal = 0,
    /// Overcurrent trip; output forced low, wait time running.
    Tripped = 1,
    /// Wait time elapsed; explicit reset required.
    Reenable = 2,
    /// Reset budget exhausted; locked low until power cycle.
    Permanent = 3,
}

impl ProtectionState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Tripped),
            2 => Some(Self::Reenable),
            3 => Some(Self::Permanent),
            _ => None,
        }
    }

    /// Result code a `Set` request receives in this state.
    #[inline]
    pub const fn blocking_error(self) -> Option<DoutError> {
        match self {
            Self::Normal => None,
            Self::Tripped => Some(DoutError::FetProtectionActive),
            Self::Reenable => Some(DoutError::FetProtectionReenable),
            Self::Permanent => Some(DoutError::FetProtectionPermanent),
        }
    }
}

/// Classification produced by the diagnostic classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum DiagnosticTag {
    /// Feedback consistent with the commanded level.
    Ok = 0,
    /// No load current while on (or floating output while off, low side).
    OpenLoad = 1,
    /// Output pulled to ground.
    ShortGround = 2,
    /// Output pulled to battery.
    ShortBattery = 3,
    /// Off-state fault the stage cannot disambiguate.
    OpenLoadOrShortBattery = 4,
    /// Diagnostics disabled, suppressed or never sampled.
    #[default]
    NoDiagnosticAvailable = 5,
    /// Channel inside its startup window.
    Startup = 6,
}

impl DiagnosticTag {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::OpenLoad),
            2 => Some(Self::ShortGround),
            3 => Some(Self::ShortBattery),
            4 => Some(Self::OpenLoadOrShortBattery),
            5 => Some(Self::NoDiagnosticAvailable),
            6 => Some(Self::Startup),
            _ => None,
        }
    }

    /// Whether the tag reports an electrical fault.
    #[inline]
    pub const fn is_fault(self) -> bool {
        matches!(
            self,
            Self::OpenLoad | Self::ShortGround | Self::ShortBattery | Self::OpenLoadOrShortBattery
        )
    }

    /// Informational result code surfaced on a successful `Set`.
    #[inline]
    pub const fn advisory(self) -> Option<DoutError> {
        match self {
            Self::Ok | Self::Startup => None,
            Self::OpenLoad => Some(DoutError::OpenLoad),
            Self::ShortGround => Some(DoutError::ShortGround),
            Self::ShortBattery => Some(DoutError::ShortBattery),
            Self::OpenLoadOrShortBattery => Some(DoutError::OpenLoadOrShortBattery),
            Self::NoDiagnosticAvailable => Some(DoutError::NoDiagnosticAvailable),
        }
    }
}

/// Configuration lifecycle phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum CyclePhase {
    /// Before the first cycle tick; outputs may be initialised.
    #[default]
    Configuration = 0,
    /// Periodic operation; output initialisation is closed.
    Cyclic = 1,
}
