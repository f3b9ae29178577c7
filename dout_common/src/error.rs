//! Result codes for the digital output engine.
//!
//! Every engine operation returns `Result<_, DoutError>`. Codes are grouped
//! by [`ErrorKind`]; configuration errors are always raised before any state
//! is mutated, diagnostic and protection conditions are raised on the call
//! they affect.

use thiserror::Error;

/// Error category of a [`DoutError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected configuration request. The call had no side effect.
    Configuration,
    /// Transient operating condition (startup, power, safe state).
    Operational,
    /// Diagnostic result from feedback classification.
    Diagnostic,
    /// Overcurrent protection state blocks the request.
    Protection,
    /// Unexpected internal failure.
    Internal,
}

/// Result code taxonomy.
///
/// The numeric value from [`DoutError::code`] is stable and is what the
/// simulator prints; [`DoutError::from_code`] is its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DoutError {
    // ── Configuration ──
    #[error("channel id unknown or unavailable on this hardware variant")]
    InvalidChannelId,
    #[error("channel does not have the requested capability")]
    CapabilityMismatch,
    #[error("channel is already configured")]
    ChannelBusy,
    #[error("channel is not configured")]
    NotConfigured,
    #[error("parameter not applicable to this channel")]
    InvalidParameter,
    #[error("voltage limits violate low_t1 < low_t2 <= high_t1 < high_t2")]
    InvalidLimits,
    #[error("invalid safety link configuration")]
    InvalidSafetyConfig,
    #[error("global safety configuration was not supplied")]
    SafetyConfigMissing,
    #[error("configuration phase is closed")]
    ConfigPhaseClosed,

    // ── Operational ──
    #[error("channel is inside its startup window")]
    Startup,
    #[error("no diagnostic available")]
    NoDiagnosticAvailable,
    #[error("safety switch of the shut-off group is disabled")]
    SafetySwitchDisabled,
    #[error("channel is in safe state")]
    SafeState,

    // ── Diagnostic ──
    #[error("open load detected")]
    OpenLoad,
    #[error("short to ground detected")]
    ShortGround,
    #[error("short to battery detected")]
    ShortBattery,
    #[error("open load or short to battery detected")]
    OpenLoadOrShortBattery,
    #[error("input voltage outside every configured band")]
    InvalidVoltage,

    // ── Protection ──
    #[error("overcurrent protection active")]
    FetProtectionActive,
    #[error("overcurrent protection ready for reenable")]
    FetProtectionReenable,
    #[error("overcurrent protection permanently active")]
    FetProtectionPermanent,
    #[error("overcurrent protection not active")]
    FetProtectionNotActive,
    #[error("overcurrent protection wait time not elapsed")]
    FetProtectionWait,

    // ── Internal ──
    #[error("internal error")]
    Internal,
}

impl DoutError {
    /// Category of this code.
    pub const fn kind(&self) -> ErrorKind {
        use DoutError::*;
        match self {
            InvalidChannelId | CapabilityMismatch | ChannelBusy | NotConfigured
            | InvalidParameter | InvalidLimits | InvalidSafetyConfig | SafetyConfigMissing
            | ConfigPhaseClosed => ErrorKind::Configuration,
            Startup | NoDiagnosticAvailable | SafetySwitchDisabled | SafeState => {
                ErrorKind::Operational
            }
            OpenLoad | ShortGround | ShortBattery | OpenLoadOrShortBattery | InvalidVoltage => {
                ErrorKind::Diagnostic
            }
            FetProtectionActive
            | FetProtectionReenable
            | FetProtectionPermanent
            | FetProtectionNotActive
            | FetProtectionWait => ErrorKind::Protection,
            Internal => ErrorKind::Internal,
        }
    }

    /// Stable numeric result code (0 is reserved for success).
    pub const fn code(&self) -> u8 {
        use DoutError::*;
        match self {
            InvalidChannelId => 1,
            CapabilityMismatch => 2,
            ChannelBusy => 3,
            NotConfigured => 4,
            InvalidParameter => 5,
            InvalidLimits => 6,
            InvalidSafetyConfig => 7,
            SafetyConfigMissing => 8,
            ConfigPhaseClosed => 9,
            Startup => 20,
            NoDiagnosticAvailable => 21,
            SafetySwitchDisabled => 22,
            SafeState => 23,
            OpenLoad => 40,
            ShortGround => 41,
            ShortBattery => 42,
            OpenLoadOrShortBattery => 43,
            InvalidVoltage => 44,
            FetProtectionActive => 60,
            FetProtectionReenable => 61,
            FetProtectionPermanent => 62,
            FetProtectionNotActive => 63,
            FetProtectionWait => 64,
            Internal => 255,
        }
    }

    /// Convert from a raw code. Returns `None` for 0 and unassigned values.
    pub const fn from_code(code: u8) -> Option<Self> {
        use DoutError::*;
        match code {
            1 => Some(InvalidChannelId),
            2 => Some(CapabilityMismatch),
            3 => Some(ChannelBusy),
            4 => Some(NotConfigured),
            5 => Some(InvalidParameter),
            6 => Some(InvalidLimits),
            7 => Some(InvalidSafetyConfig),
            8 => Some(SafetyConfigMissing),
            9 => Some(ConfigPhaseClosed),
            20 => Some(Startup),
            21 => Some(NoDiagnosticAvailable),
            22 => Some(SafetySwitchDisabled),
            23 => Some(SafeState),
            40 => Some(OpenLoad),
            41 => Some(ShortGround),
            42 => Some(ShortBattery),
            43 => Some(OpenLoadOrShortBattery),
            44 => Some(InvalidVoltage),
            60 => Some(FetProtectionActive),
            61 => Some(FetProtectionReenable),
            62 => Some(FetProtectionPermanent),
            63 => Some(FetProtectionNotActive),
            64 => Some(FetProtectionWait),
            255 => Some(Internal),
            _ => None,
        }
    }
}
