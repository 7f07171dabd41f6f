//! Atomic Bus Lock Controller.
//!
//! A lock instruction binds the next two data-bus operations together: once the first of
//! them issues, the fetch unit may start no bus transaction until the second has completed.
//!
//! `Idle → Priming → Armed → Idle`, with any pipeline clear collapsing straight to `Idle`.

use tracing::{debug, warn};

/// Number of bus operations a lock covers.
pub const LOCKED_OPERATIONS: u8 = 2;

/// Lock sequencing state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockState {
    /// No lock requested.
    #[default]
    Idle,
    /// A lock instruction issued; waiting for the first bus operation.
    Priming,
    /// The bus is held; `remaining` locked operations still have to issue.
    Armed {
        /// Locked operations not yet issued.
        remaining: u8,
    },
}

/// Bus lock sequencing.
#[derive(Clone, Debug, Default)]
pub struct LockController {
    enabled: bool,
    state: LockState,
    sequences: u64,
}

impl LockController {
    /// Creates the controller. When `enabled` is false lock instructions are no-ops.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Current state.
    pub const fn state(&self) -> LockState {
        self.state
    }

    /// True while a lock sequence is in progress.
    pub const fn held(&self) -> bool {
        !matches!(self.state, LockState::Idle)
    }

    /// True while fetch must stay off the bus. Mode switches, drains and cache clears wait
    /// for this to drop.
    pub const fn bus_lock(&self) -> bool {
        matches!(self.state, LockState::Armed { .. })
    }

    /// Completed-or-started lock sequences since reset.
    pub const fn sequences(&self) -> u64 {
        self.sequences
    }

    /// A lock instruction issued.
    pub fn on_lock_issue(&mut self) {
        if !self.enabled {
            return;
        }
        debug!("bus lock priming");
        self.state = LockState::Priming;
    }

    /// A memory operation issues.
    ///
    /// # Returns
    ///
    /// `true` if the memory unit must keep the bus after this operation.
    pub fn on_memory_issue(&mut self) -> bool {
        match self.state {
            LockState::Idle => false,
            LockState::Priming => {
                self.sequences += 1;
                self.state = LockState::Armed {
                    remaining: LOCKED_OPERATIONS - 1,
                };
                debug!("bus lock armed");
                true
            }
            LockState::Armed { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.state = LockState::Armed { remaining };
                remaining > 0
            }
        }
    }

    /// End-of-cycle release check.
    ///
    /// # Arguments
    ///
    /// * `memory_idle` - The memory unit has nothing outstanding.
    /// * `pipeline_empty` - No instruction is waiting in fetch, decode or operand read, so
    ///   no further locked operation can arrive while fetch is starved.
    pub fn evaluate(&mut self, memory_idle: bool, pipeline_empty: bool) {
        if let LockState::Armed { remaining } = self.state {
            if !memory_idle {
                return;
            }
            if remaining == 0 {
                debug!("bus lock released");
                self.state = LockState::Idle;
            } else if pipeline_empty {
                warn!(remaining, "bus lock starved; releasing");
                self.state = LockState::Idle;
            }
        }
    }

    /// Pipeline clear.
    pub fn clear(&mut self) {
        self.state = LockState::Idle;
    }
}
