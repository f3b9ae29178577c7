//! # Digital Output Protection Engine
//!
//! Drives switched power-stage outputs of an ECU and protects them against
//! electrical faults. Every channel's commanded level, diagnostic state and
//! overcurrent protection state are owned here; the application talks to
//! the engine only through [`OutputEngine`].
//!
//! ## Components
//!
//! - **Channel Registry** ([`registry`]): per-channel configuration slots
//! - **Limits Validator** ([`limits`]): voltage-band thresholds for inputs
//! - **Safety Link Resolver** ([`safety_link`]): high/low-side output pairs
//! - **Diagnostic Classifier** ([`diagnostic`]): feedback → fault tag, plus
//!   fatal-overcurrent qualification
//! - **Protection State Machine** ([`protection`]): trip, wait, reset, latch
//! - **Output Command Gateway** ([`gateway`]): `set` / `get_*` surface
//!
//! ## Cycle Model
//!
//! The caller invokes [`OutputEngine::tick`] once per cycle with the
//! feedback samples delivered since the previous tick. Application calls
//! happen between ticks on the same thread. Time comes from a [`Clock`];
//! the engine never blocks.
//!
//! ```
//! use dout_common::prelude::*;
//! use dout_engine::{FeedbackSample, ManualClock, OutputEngine, OutputInit, PowerStatus};
//!
//! let clock = ManualClock::new();
//! let mut engine = OutputEngine::new(EngineConfig::default(), clock.clone()).unwrap();
//! engine.apply_power_status(PowerStatus::all_enabled());
//! engine.init_output(2, OutputInit::with_diagnostics()).unwrap();
//! engine.tick(&[]);
//!
//! engine.set(2, true).unwrap();
//! clock.advance_ms(20);
//! engine.tick(&[FeedbackSample::current(2, 800)]);
//! assert_eq!(engine.diagnostic(2).unwrap().tag, DiagnosticTag::Ok);
//! ```

pub mod clock;
pub mod cycle;
pub mod diagnostic;
pub mod engine;
pub mod feedback;
pub mod gateway;
pub mod limits;
pub mod power;
pub mod protection;
pub mod registry;
pub mod safety_link;
pub mod scenario;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cycle::{ChannelDiagnostic, CycleReport, SpiFrame};
pub use diagnostic::DiagnosticSample;
pub use engine::{OutputEngine, OutputInit, ProtectionStatus};
pub use feedback::{FeedbackKind, FeedbackSample, Reading};
pub use gateway::SetOutcome;
pub use limits::VoltageLimits;
pub use power::{PowerStatus, SafeStateScope};
pub use safety_link::SafetyLinkConfig;
