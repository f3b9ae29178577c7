//! Per-channel overcurrent protection state machine.
//!
//! ```text
//!   Normal ──Overcurrent──▶ Tripped ──wait elapsed──▶ Reenable
//!     ▲                                                  │
//!     └──────────────Reset (count ≤ limit)───────────────┘
//!                        Reset (count > limit) ──▶ Permanent
//! ```
//!
//! The Tripped → Reenable edge is timer driven and evaluated lazily by
//! [`ProtectionMachine::observe`]. Every read path observes first, so the
//! transition happens no later than the first query after the wait.

use std::time::Duration;

use dout_common::consts::MAX_PROTECTION_RESETS;
use dout_common::error::DoutError;
use dout_common::state::ProtectionState;

// ─── Protection Event ───────────────────────────────────────────────

/// Events that drive the protection machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionEvent {
    /// Qualified fatal overcurrent from the classifier.
    Overcurrent,
    /// Application-requested reset.
    Reset,
}

/// Result of a protection transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionTransition {
    /// State changed.
    Ok(ProtectionState),
    /// Transition rejected, with the result code for the caller.
    Rejected(DoutError),
}

// ─── Protection Machine ─────────────────────────────────────────────

/// Protection state of one output channel.
#[derive(Debug, Clone, Copy)]
pub struct ProtectionMachine {
    state: ProtectionState,
    /// Successful resets this session. Never cleared except by restart.
    reset_count: u8,
    tripped_at: Duration,
    wait: Duration,
}

impl ProtectionMachine {
    /// Create a machine in `Normal` with the group's re-enable wait.
    pub const fn new(wait: Duration) -> Self {
        Self {
            state: ProtectionState::Normal,
            reset_count: 0,
            tripped_at: Duration::ZERO,
            wait,
        }
    }

    /// State as last evaluated. Callers needing an up-to-date answer use
    /// [`observe`](Self::observe).
    #[inline]
    pub const fn state(&self) -> ProtectionState {
        self.state
    }

    #[inline]
    pub const fn reset_count(&self) -> u8 {
        self.reset_count
    }

    /// Time of the last trip.
    #[inline]
    pub const fn tripped_at(&self) -> Duration {
        self.tripped_at
    }

    /// Evaluate the timer edge. Returns the new state if it changed.
    pub fn observe(&mut self, now: Duration) -> Option<ProtectionState> {
        if self.state == ProtectionState::Tripped
            && now.saturating_sub(self.tripped_at) >= self.wait
        {
            self.state = ProtectionState::Reenable;
            return Some(ProtectionState::Reenable);
        }
        None
    }

    /// Handle a protection event at time `now`.
    pub fn handle_event(&mut self, event: ProtectionEvent, now: Duration) -> ProtectionTransition {
        use ProtectionEvent::*;
        use ProtectionState::*;

        self.observe(now);

        match (self.state, event) {
            (Normal, Overcurrent) => {
                self.state = Tripped;
                self.tripped_at = now;
                ProtectionTransition::Ok(Tripped)
            }
            // Output is already forced low; further overcurrent is moot.
            (Tripped | Reenable | Permanent, Overcurrent) => {
                ProtectionTransition::Rejected(DoutError::FetProtectionActive)
            }

            (Normal, Reset) => ProtectionTransition::Rejected(DoutError::FetProtectionNotActive),
            (Tripped, Reset) => ProtectionTransition::Rejected(DoutError::FetProtectionWait),
            (Reenable, Reset) if self.reset_count >= MAX_PROTECTION_RESETS => {
                self.state = Permanent;
                ProtectionTransition::Ok(Permanent)
            }
            (Reenable, Reset) => {
                self.reset_count += 1;
                self.state = Normal;
                ProtectionTransition::Ok(Normal)
            }
            (Permanent, Reset) => ProtectionTransition::Rejected(DoutError::FetProtectionPermanent),
        }
    }

    /// Record a qualified overcurrent. Returns `true` if this tripped the
    /// channel.
    pub fn trip(&mut self, now: Duration) -> bool {
        matches!(
            self.handle_event(ProtectionEvent::Overcurrent, now),
            ProtectionTransition::Ok(ProtectionState::Tripped)
        )
    }

    /// Application reset. Returns the updated counter on success.
    ///
    /// A reset that exhausts the counter latches `Permanent` and is
    /// reported as `FetProtectionPermanent`.
    pub fn reset(&mut self, now: Duration) -> Result<u8, DoutError> {
        match self.handle_event(ProtectionEvent::Reset, now) {
            ProtectionTransition::Ok(ProtectionState::Normal) => Ok(self.reset_count),
            ProtectionTransition::Ok(_) => Err(DoutError::FetProtectionPermanent),
            ProtectionTransition::Rejected(e) => Err(e),
        }
    }

    /// Channel deinitialised: clear a pending trip. `Permanent` and the
    /// reset counter survive.
    pub fn release(&mut self) {
        if self.state != ProtectionState::Permanent {
            self.state = ProtectionState::Normal;
        }
    }
}

impl Default for ProtectionMachine {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
