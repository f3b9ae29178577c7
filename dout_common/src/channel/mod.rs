//! Channel table and per-group hardware profiles.
//!
//! The table is fixed per hardware build; a [`HardwareVariant`] selects the
//! subset that is populated. Group profiles hold the hardware-measured
//! diagnostic and protection constants.

pub mod profile;
pub mod table;

pub use profile::{FeedbackSource, GroupProfile, GroupProfiles, OvercurrentRule, SwitchPolarity};
pub use table::{
    CHANNEL_TABLE, ChannelCaps, ChannelDescriptor, ChannelGroup, ChannelId, HardwareVariant,
    PullConfig, VariantMask, lookup_descriptor,
};
