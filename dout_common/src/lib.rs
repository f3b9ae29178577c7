//! Digital Output Common Library
//!
//! Shared constants, configuration loading, the static channel table and the
//! result-code taxonomy used by the output protection engine and its tools.
//!
//! # Module Structure
//!
//! - [`consts`] - Table sizes, protection limits and configuration bounds
//! - [`config`] - Configuration loading traits and engine configuration
//! - [`channel`] - Channel descriptors, capability flags and group profiles
//! - [`error`] - Result codes returned by every engine operation
//! - [`state`] - Protection and diagnostic enums
//! - [`bank`] - Bit-packed output image helpers
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use dout_common::prelude::*;
//!
//! let desc = lookup_descriptor(0).unwrap();
//! assert_eq!(desc.group, ChannelGroup::DirectA);
//! ```

pub mod bank;
pub mod channel;
pub mod config;
pub mod consts;
pub mod error;
pub mod prelude;
pub mod state;
