//! Voltage-band limits for inputs with analog feedback.
//!
//! Validated once at input initialisation; classification uses the stored
//! value as-is.

use serde::{Deserialize, Serialize};

use dout_common::consts::DEFAULT_VOLTAGE_LIMITS_MV;
use dout_common::error::DoutError;

/// Four ordered thresholds [mV]: `low_t1 < low_t2 <= high_t1 < high_t2`.
///
/// `[low_t1, low_t2)` reads low, `[high_t1, high_t2]` reads high, anything
/// else is an invalid voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoltageLimits {
    pub low_t1: u16,
    pub low_t2: u16,
    pub high_t1: u16,
    pub high_t2: u16,
}

impl VoltageLimits {
    pub const DEFAULT: Self = Self::new(
        DEFAULT_VOLTAGE_LIMITS_MV[0],
        DEFAULT_VOLTAGE_LIMITS_MV[1],
        DEFAULT_VOLTAGE_LIMITS_MV[2],
        DEFAULT_VOLTAGE_LIMITS_MV[3],
    );

    pub const fn new(low_t1: u16, low_t2: u16, high_t1: u16, high_t2: u16) -> Self {
        Self {
            low_t1,
            low_t2,
            high_t1,
            high_t2,
        }
    }

    /// Check the threshold ordering.
    pub const fn validate(&self) -> Result<(), DoutError> {
        if self.low_t1 < self.low_t2 && self.low_t2 <= self.high_t1 && self.high_t1 < self.high_t2
        {
            Ok(())
        } else {
            Err(DoutError::InvalidLimits)
        }
    }

    /// Validate supplied limits, or substitute the default when absent.
    pub fn resolve(limits: Option<Self>) -> Result<Self, DoutError> {
        let limits = limits.unwrap_or(Self::DEFAULT);
        limits.validate()?;
        Ok(limits)
    }

    /// Map a pin voltage to a logical level.
    pub const fn classify(&self, millivolts: u16) -> Result<bool, DoutError> {
        if millivolts >= self.low_t1 && millivolts < self.low_t2 {
            Ok(false)
        } else if millivolts >= self.high_t1 && millivolts <= self.high_t2 {
            Ok(true)
        } else {
            Err(DoutError::InvalidVoltage)
        }
    }
}

impl Default for VoltageLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
