//! Control Events and Pipeline Clears.
//!
//! This module turns what the writeback arbiter committed into control decisions. It performs
//! the following:
//! 1. **Retirement Bookkeeping:** Releases scoreboard claims, counts retirements and ends
//!    single steps.
//! 2. **Faults and Breaks:** Routes user faults and breaks to the mode controller and stops
//!    the core on supervisor faults and enabled breaks.
//! 3. **Mode Transitions:** Interprets CC writes (trap, release, sleep) and user-to-supervisor
//!    switches.
//! 4. **Pipeline Clear:** Flushes every stage, starts a new epoch and redirects fetch. At most
//!    one clear happens per cycle; the last requested target wins.

use tracing::{debug, info};

use crate::core::arch::mode::Mode;
use crate::core::control::interrupt::{ModeTransition, SwitchContext, SwitchReason};
use crate::core::cpu::{Core, DebugStep};
use crate::core::pipeline::hazards::Forward;
use crate::core::pipeline::traits::PipelineLatch;
use crate::core::writeback::WritebackEffects;

/// Control events gathered over one cycle.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CycleEvents {
    /// Pipeline clear: fetch target and the bundle phase to resume at.
    pub clear: Option<(u32, bool)>,
    /// A CC register was written this cycle.
    pub cc_write: bool,
    /// The mode changed this cycle.
    pub transitioned: bool,
    /// Address of the retired instruction.
    pub retired: Option<u32>,
    /// This cycle's register commit.
    pub forward: Option<Forward>,
}

impl CycleEvents {
    fn request_clear(&mut self, target: u32, phase: bool) {
        self.clear = Some((target, phase));
    }
}

impl Core {
    /// Acts on one commit of the writeback arbiter.
    pub(crate) fn absorb(&mut self, fx: WritebackEffects, ev: &mut CycleEvents) {
        if fx.discarded {
            self.stats.results_discarded += 1;
        }
        ev.forward = fx.forward;

        if let Some(e) = fx.retired {
            if let Some(dest) = e.dest {
                self.scoreboard.clear_if_match(dest, e.seq);
            }
            self.stats.instructions_retired += 1;
            if e.mode == Mode::User {
                self.modes.note_user_retire(&self.state);
            }
            if self.debug_step == Some(DebugStep::Issued(e.seq)) {
                self.debug_step = None;
            }
            ev.retired = Some(e.pc);
        }

        if let Some(rec) = fx.fault {
            self.stats.faults += 1;
            match rec.mode {
                Mode::User => self.modes.note_user_fault(),
                Mode::Supervisor => info!(%rec, "supervisor fault, core stopped"),
            }
            ev.request_clear(rec.pc, self.state.status(rec.mode).phase);
        }

        if let Some(e) = fx.brk {
            let stops = e.mode == Mode::Supervisor
                || self.state.status(Mode::Supervisor).break_enable;
            if stops {
                info!(pc = e.pc, mode = %e.mode, "break, core stopped");
                self.break_pending = true;
            } else {
                self.modes.note_user_break(&mut self.state);
            }
            ev.request_clear(e.pc, e.phase);
        }

        if let Some(target) = fx.redirect {
            if fx.debug {
                self.break_pending = false;
            }
            ev.request_clear(target, false);
        } else if fx.debug {
            let mode = self.state.mode();
            ev.request_clear(self.state.pc(mode), self.state.status(mode).phase);
        }

        if let Some(w) = fx.cc_write {
            ev.cc_write = true;
            self.cc_hold = true;
            if let Some(t) = self.modes.on_cc_write(&mut self.state, w) {
                let (pc, phase) = self.modes.apply(&mut self.state, t);
                ev.transitioned = true;
                ev.request_clear(pc, phase);
            }
        }
    }

    /// Fires a pending User-to-Supervisor switch.
    ///
    /// # Arguments
    ///
    /// * `ev` - This cycle's events; a clear already requested counts as drained.
    /// * `halted` - The debug port holds the core.
    pub(crate) fn try_switch(&mut self, ev: &mut CycleEvents, halted: bool) {
        if ev.transitioned {
            return;
        }
        let ctx = SwitchContext {
            units_idle: ev.clear.is_some() || self.units_idle(),
            bundle_open: self.bundle_open && ev.clear.is_none(),
            bus_locked: self.lock.bus_lock(),
            halted,
        };
        let Some(reason) = self.modes.pending_switch(&self.state, ctx) else {
            return;
        };
        let (pc, phase) = self
            .modes
            .apply(&mut self.state, ModeTransition::Enter(reason));
        self.stats.supervisor_entries += 1;
        if reason == SwitchReason::Interrupt {
            self.stats.interrupts_taken += 1;
        }
        ev.transitioned = true;
        ev.request_clear(pc, phase);
    }

    /// Flushes the pipeline and redirects fetch.
    ///
    /// Decode and operand latches empty, scoreboard claims drop, and the epoch advances so
    /// results still reported by the units are discarded when they arrive.
    pub(crate) fn clear_pipeline(&mut self, target: u32, phase: bool) {
        self.decode.flush();
        self.operand.flush();
        self.execute.flush();
        self.scoreboard.flush();
        self.stats.results_discarded += self.writeback.flush() as u64;
        self.epoch += 1;
        self.lock.clear();
        self.bundle_open = false;
        if matches!(self.debug_step, Some(DebugStep::Issued(_))) {
            self.debug_step = None;
        }
        self.redirect = Some(target);
        self.resume_phase = phase;
        self.stats.pipeline_clears += 1;
        debug!(
            epoch = self.epoch,
            phase,
            "pipeline clear, fetch from {target:#010x}"
        );
    }
}
