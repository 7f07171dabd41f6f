//! Core Definition and Initialization.
//!
//! This module defines the central `Core` structure, the container for the entire control
//! state of the pipeline. It coordinates the following:
//! 1. **State Management:** Owns the architectural state, the stage latches, the scoreboard and
//!    the writeback arbiter.
//! 2. **Collaborators:** Drives the decoder, fetch, ALU, memory, divide and floating-point units
//!    through their trait interfaces.
//! 3. **Host Interface:** Exchanges `CoreInputs`/`CoreOutputs` with the host once per cycle.

/// Unit collection and instruction dispatch.
pub mod dispatch;

/// Per-cycle orchestration.
pub mod execution;

/// Faults, breaks, mode transitions and pipeline clears.
pub mod trap;

use crate::common::error::CoreError;
use crate::config::Config;
use crate::core::arch::mode::Mode;
use crate::core::arch::state::ArchState;
use crate::core::control::debug::{DebugCommand, DebugSnapshot};
use crate::core::control::interrupt::ModeController;
use crate::core::control::lock::{LockController, LockState};
use crate::core::pipeline::latches::{DecodeEntry, ExecuteStage, OperandEntry, StageLatch};
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::units::Units;
use crate::core::writeback::WritebackArbiter;
use crate::stats::CoreStats;

/// Host-driven inputs for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreInputs {
    /// External interrupt line.
    pub interrupt: bool,
    /// Debug halt request.
    pub halt: bool,
    /// Debug-port command.
    pub debug: Option<DebugCommand>,
    /// Invalidate the instruction cache and refetch.
    pub clear_cache: bool,
}

/// Outputs of one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreOutputs {
    /// Nothing executes and the debug port may write registers.
    pub halted: bool,
    /// The master clock enable was off this cycle.
    pub stalled: bool,
    /// The fetch unit is kept off the bus.
    pub bus_lock: bool,
    /// Debug-port response.
    pub debug: Option<DebugSnapshot>,
    /// Address of the instruction that retired this cycle.
    pub retired: Option<u32>,
    /// A pipeline-clearing event happened this cycle.
    pub cleared: bool,
}

/// Progress of a debug single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DebugStep {
    /// Requested; no instruction issued yet.
    Armed,
    /// The instruction with this sequence number is running.
    Issued(u64),
}

/// The pipeline control core.
///
/// Owns every piece of per-stage state and the architectural state. The host advances it one
/// cycle at a time with [`Core::tick`].
#[derive(Debug)]
pub struct Core {
    pub(crate) config: Config,
    pub(crate) state: ArchState,
    pub(crate) units: Units,

    pub(crate) decode: StageLatch<DecodeEntry>,
    pub(crate) operand: StageLatch<OperandEntry>,
    pub(crate) execute: ExecuteStage,
    pub(crate) scoreboard: Scoreboard,
    pub(crate) writeback: WritebackArbiter,

    pub(crate) modes: ModeController,
    pub(crate) lock: LockController,

    /// Incremented on every pipeline clear; in-flight results carry the epoch they issued in.
    pub(crate) epoch: u64,
    pub(crate) next_seq: u64,
    /// First half of a compact bundle issued, second half not yet.
    pub(crate) bundle_open: bool,
    /// Break instruction retired; the core stays stopped until the debug port moves the PC.
    pub(crate) break_pending: bool,
    pub(crate) debug_step: Option<DebugStep>,
    pub(crate) cache_clear_pending: bool,
    /// A CC write committed last cycle; nothing commits this cycle.
    pub(crate) cc_hold: bool,
    /// Fetch target to hand to the fetch unit at the end of this cycle.
    pub(crate) redirect: Option<u32>,
    /// The next decoded word resumes at its second half.
    pub(crate) resume_phase: bool,

    pub(crate) stats: CoreStats,
}

impl Core {
    /// Creates a core in its reset state.
    ///
    /// # Arguments
    ///
    /// * `config` - Core configuration; validated here.
    /// * `units` - Collaborator units. Optional units must be present when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an invalid configuration and
    /// [`CoreError::MissingUnit`] if an enabled divide or floating-point unit is absent.
    pub fn new(config: Config, units: Units) -> Result<Self, CoreError> {
        config.validate()?;
        if config.features.divide && units.divide.is_none() {
            return Err(CoreError::MissingUnit("divide"));
        }
        if config.features.fpu && units.fpu.is_none() {
            return Err(CoreError::MissingUnit("floating-point"));
        }

        let reset = config.general.reset_address;
        Ok(Self {
            state: ArchState::new(reset, config.features.user_mode),
            units,
            decode: StageLatch::default(),
            operand: StageLatch::default(),
            execute: ExecuteStage::default(),
            scoreboard: Scoreboard::new(),
            writeback: WritebackArbiter::new(),
            modes: ModeController::new(config.features.user_mode),
            lock: LockController::new(config.features.lock),
            epoch: 0,
            next_seq: 0,
            bundle_open: false,
            break_pending: false,
            debug_step: None,
            cache_clear_pending: false,
            cc_hold: false,
            redirect: Some(reset),
            resume_phase: false,
            stats: CoreStats::default(),
            config,
        })
    }

    /// Returns the core to its reset state. Collaborator units are kept; the next cycle
    /// redirects fetch to the reset address.
    pub fn reset(&mut self) {
        let reset = self.config.general.reset_address;
        self.state = ArchState::new(reset, self.config.features.user_mode);
        self.decode = StageLatch::default();
        self.operand = StageLatch::default();
        self.scoreboard.flush();
        self.writeback = WritebackArbiter::new();
        self.modes = ModeController::new(self.config.features.user_mode);
        self.lock = LockController::new(self.config.features.lock);
        // In-flight unit work is still reported; a new epoch marks it stale.
        self.epoch += 1;
        self.bundle_open = false;
        self.break_pending = false;
        self.debug_step = None;
        self.cache_clear_pending = false;
        self.cc_hold = false;
        self.redirect = Some(reset);
        self.resume_phase = false;
        self.stats = CoreStats::default();
    }

    /// Architectural state.
    pub const fn state(&self) -> &ArchState {
        &self.state
    }

    /// Current privilege mode.
    pub const fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Performance counters.
    pub const fn stats(&self) -> &CoreStats {
        &self.stats
    }

    /// Configuration the core was built with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Bus lock sequencing state.
    pub const fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    /// The core stopped on a break instruction or a supervisor fault.
    pub fn is_broken(&self) -> bool {
        self.break_pending || self.state.status(Mode::Supervisor).any_fault()
    }

    /// Pipeline-clear epoch.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the decode and operand-read stages hold valid instructions.
    pub const fn stage_valid(&self) -> (bool, bool) {
        (self.decode.valid, self.operand.valid)
    }

    /// Number of instructions handed to units and not yet retired.
    pub fn in_flight(&self) -> usize {
        self.execute.live(self.epoch).count()
            + self
                .writeback
                .iter()
                .filter(|c| c.entry.epoch == self.epoch)
                .count()
    }
}
