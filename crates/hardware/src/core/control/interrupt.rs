//! Mode and Interrupt Controller.
//!
//! This module decides when the core moves between Supervisor and User mode. It performs
//! the following:
//! 1. **Interrupt Latching:** Holds an external interrupt seen in User mode until it is taken.
//! 2. **Switch Requests:** Collects the user-side reasons to enter Supervisor (interrupt,
//!    fault, trap, break, single step) and fires the switch once the pipeline has drained.
//! 3. **Release:** Interprets supervisor CC writes with GIE set as a return to User mode.
//! 4. **Sleep:** Parks the current mode on a CC write with SLEEP and wakes it on interrupt.

use std::fmt;

use tracing::debug;

use crate::common::constants::{CC_GIE, CC_SLEEP};
use crate::core::arch::mode::Mode;
use crate::core::arch::state::ArchState;

/// Why the core entered Supervisor mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwitchReason {
    /// External interrupt.
    Interrupt,
    /// A user instruction faulted.
    Fault,
    /// User code cleared GIE in its own CC.
    Trap,
    /// User code executed a break without break-enable.
    UserBreak,
    /// The single-step budget was used up.
    Step,
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interrupt => "interrupt",
            Self::Fault => "fault",
            Self::Trap => "trap",
            Self::UserBreak => "user break",
            Self::Step => "step",
        };
        f.write_str(name)
    }
}

/// Mode change decided this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeTransition {
    /// User to Supervisor ("switch to interrupt").
    Enter(SwitchReason),
    /// Supervisor to User ("release from interrupt").
    Release,
}

impl ModeTransition {
    /// Mode active after the transition.
    pub const fn target(self) -> Mode {
        match self {
            Self::Enter(_) => Mode::Supervisor,
            Self::Release => Mode::User,
        }
    }
}

/// A committed write to a CC register, as seen by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CcWrite {
    /// Bank written.
    pub target: Mode,
    /// Mode of the writing instruction; `None` for the debug port.
    pub writer: Option<Mode>,
    /// Written value.
    pub value: u32,
}

/// Pipeline facts the switch decision depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwitchContext {
    /// No instruction is executing or waiting to commit.
    pub units_idle: bool,
    /// The first half of a compact bundle has issued and the second has not.
    pub bundle_open: bool,
    /// A locked bus sequence is in progress.
    pub bus_locked: bool,
    /// The debug port holds the core.
    pub halted: bool,
}

/// Supervisor/user mode sequencing.
#[derive(Clone, Debug, Default)]
pub struct ModeController {
    enabled: bool,
    interrupt: bool,
    fault: bool,
    trap: bool,
    user_break: bool,
    step_done: bool,
    user_issued: u32,
}

impl ModeController {
    /// Creates the controller. With `enabled == false` the core never leaves Supervisor.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Samples the external interrupt line.
    ///
    /// In User mode a request is latched until the switch takes it. In Supervisor mode
    /// interrupts are disabled, so the latch simply follows the line.
    pub fn sample_interrupt(&mut self, line: bool, mode: Mode) {
        match mode {
            Mode::User => self.interrupt |= line,
            Mode::Supervisor => self.interrupt = line,
        }
    }

    /// An interrupt is pending.
    pub const fn interrupt_pending(&self) -> bool {
        self.interrupt
    }

    /// Records a user fault; the switch follows once the pipeline drains.
    pub fn note_user_fault(&mut self) {
        self.fault = true;
    }

    /// Records a user break without break-enable and latches it in the user CC.
    pub fn note_user_break(&mut self, state: &mut ArchState) {
        state.status_mut(Mode::User).user_break.set();
        self.user_break = true;
    }

    /// Records an instruction issued to the pipeline in `mode`.
    pub fn note_issue(&mut self, mode: Mode) {
        if mode == Mode::User {
            self.user_issued = self.user_issued.saturating_add(1);
        }
    }

    /// Records a user instruction retiring; with STEP set that ends the step.
    pub fn note_user_retire(&mut self, state: &ArchState) {
        if state.status(Mode::User).step {
            self.step_done = true;
        }
    }

    /// True if user single-step already let an instruction through.
    pub fn step_exhausted(&self, state: &ArchState) -> bool {
        state.mode() == Mode::User && state.status(Mode::User).step && self.user_issued > 0
    }

    /// Interprets the GIE and SLEEP bits of a committed CC write.
    ///
    /// The status bits themselves were already applied by the writeback arbiter.
    ///
    /// # Returns
    ///
    /// `Some(ModeTransition::Release)` if a supervisor write asks to return to User mode and
    /// no interrupt blocks it.
    pub fn on_cc_write(&mut self, state: &mut ArchState, write: CcWrite) -> Option<ModeTransition> {
        let gie = write.value & CC_GIE != 0;
        let sleep = write.value & CC_SLEEP != 0;
        match (write.writer, write.target) {
            (Some(Mode::User), Mode::User) if !gie && self.enabled => {
                state.status_mut(Mode::User).trap.set();
                self.trap = true;
                None
            }
            (Some(Mode::Supervisor), Mode::Supervisor) if gie => {
                // Without User mode, GIE with SLEEP is a plain wait for interrupt.
                if !self.enabled {
                    return None;
                }
                // Otherwise SLEEP belongs to the user being released.
                state.status_mut(Mode::Supervisor).sleep = false;
                if self.interrupt {
                    debug!("release blocked: interrupt pending");
                    return None;
                }
                state.status_mut(Mode::User).sleep = sleep;
                Some(ModeTransition::Release)
            }
            _ => None,
        }
    }

    /// Wakes a sleeping supervisor on interrupt. A sleeping user wakes through the switch.
    pub fn wake(&self, state: &mut ArchState) {
        if self.interrupt && state.mode() == Mode::Supervisor {
            let st = state.status_mut(Mode::Supervisor);
            if st.sleep {
                debug!("supervisor wakes on interrupt");
                st.sleep = false;
            }
        }
    }

    /// The User-to-Supervisor switch to fire this cycle, if any.
    pub fn pending_switch(&self, state: &ArchState, ctx: SwitchContext) -> Option<SwitchReason> {
        if !self.enabled
            || state.mode() != Mode::User
            || ctx.bus_locked
            || !ctx.units_idle
            || ctx.halted
        {
            return None;
        }
        if self.fault {
            Some(SwitchReason::Fault)
        } else if self.user_break {
            Some(SwitchReason::UserBreak)
        } else if self.trap {
            Some(SwitchReason::Trap)
        } else if self.interrupt && !ctx.bundle_open {
            Some(SwitchReason::Interrupt)
        } else if self.step_done {
            Some(SwitchReason::Step)
        } else {
            None
        }
    }

    /// Performs a mode transition.
    ///
    /// # Returns
    ///
    /// Where fetch resumes: the PC of the entered mode, and whether execution restarts at
    /// the second half of a compact bundle. The caller clears the pipeline.
    pub fn apply(&mut self, state: &mut ArchState, transition: ModeTransition) -> (u32, bool) {
        self.user_issued = 0;
        match transition {
            ModeTransition::Enter(reason) => {
                debug!(%reason, "enter supervisor, upc={:#010x}", state.pc(Mode::User));
                state.mode = Mode::Supervisor;
                state.status_mut(Mode::User).sleep = false;
                self.fault = false;
                self.trap = false;
                self.user_break = false;
                self.step_done = false;
                if reason == SwitchReason::Interrupt {
                    self.interrupt = false;
                }
                (state.pc(Mode::Supervisor), false)
            }
            ModeTransition::Release => {
                debug!("release to user, upc={:#010x}", state.pc(Mode::User));
                state.mode = Mode::User;
                self.step_done = false;
                let user = state.status_mut(Mode::User);
                user.trap.reset();
                user.user_break.reset();
                let phase = std::mem::take(&mut user.phase);
                (state.pc(Mode::User), phase)
            }
        }
    }
}
