//! Prelude module for common re-exports.
//!
//! ```rust
//! use dout_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, EngineConfig, GlobalSafetyConfig, LogLevel, SharedConfig,
};

// ─── Channel Table ──────────────────────────────────────────────────
pub use crate::channel::{
    ChannelCaps, ChannelDescriptor, ChannelGroup, ChannelId, FeedbackSource, GroupProfile,
    GroupProfiles, HardwareVariant, OvercurrentRule, PullConfig, SwitchPolarity,
    lookup_descriptor,
};

// ─── Result Codes & State ───────────────────────────────────────────
pub use crate::error::{DoutError, ErrorKind};
pub use crate::state::{CyclePhase, DiagnosticTag, ProtectionState};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::bank::OutputBank;
pub use crate::consts::{MAX_CHANNELS, MAX_PROTECTION_RESETS, MAX_SHUTOFF_GROUPS};
