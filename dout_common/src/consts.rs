//! System-wide constants for the digital output workspace.
//!
//! Single source of truth for table sizes, protection limits and
//! configuration bounds. Imported by all crates.

/// Number of entries in the static channel table.
pub const MAX_CHANNELS: usize = 32;

/// Number of shut-off groups reported by the power collaborator.
pub const MAX_SHUTOFF_GROUPS: usize = 4;

/// Successful protection resets allowed per power-on session.
pub const MAX_PROTECTION_RESETS: u8 = 10;

/// Words needed to bit-pack one flag per channel.
pub const BANK_WORDS: usize = MAX_CHANNELS.div_ceil(64);

/// Default cycle period in milliseconds.
pub const DEFAULT_CYCLE_TIME_MS: u32 = 1;

/// Cycle period bounds [ms].
pub const CYCLE_TIME_MS_MIN: u32 = 1;
pub const CYCLE_TIME_MS_MAX: u32 = 100;

/// Default SPI shift-register refresh period in milliseconds.
pub const DEFAULT_SPI_REFRESH_MS: u32 = 10;

/// SPI refresh bounds [ms].
pub const SPI_REFRESH_MS_MIN: u32 = 1;
pub const SPI_REFRESH_MS_MAX: u32 = 1000;

/// Protection wait-time bounds [ms].
pub const WAIT_MS_MIN: u32 = 1;
pub const WAIT_MS_MAX: u32 = 60_000;

/// Diagnostic settling-window upper bound [ms].
pub const SETTLE_MS_MAX: u32 = 1000;

/// Startup qualification-window upper bound [ms].
pub const STARTUP_MS_MAX: u32 = 10_000;

/// Default voltage limits `{low_t1, low_t2, high_t1, high_t2}` [mV].
pub const DEFAULT_VOLTAGE_LIMITS_MV: [u16; 4] = [0, 2500, 2500, 32000];

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dout/dout.toml";
