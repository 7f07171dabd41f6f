//! Pipeline Stage Sequencer.
//!
//! This module computes the per-cycle valid/stall/clock-enable signals of the controlled stages.
//! It provides:
//! 1. **Pure Rules:** `compute_stall`, `compute_enable` and `next_valid`, the three equations
//!    every stage obeys.
//! 2. **Evaluation Order:** `evaluate`, which applies the rules from the last stage to the first
//!    so each stage sees the stall of the stage after it.
//!
//! The controlled stages are Decode (accepts from the fetch output), Operand (accepts from
//! Decode) and Issue (hands the operand-read instruction to a unit). Issue has no latch of its
//! own: the units keep their own state, so its `valid` is always false.

/// Number of controlled stages.
pub const STAGE_COUNT: usize = 3;

/// A controlled stage, indexed in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Fetch output to decode latch.
    Decode = 0,
    /// Decode latch to operand latch (operand read).
    Operand = 1,
    /// Operand latch to an execution unit.
    Issue = 2,
}

impl Stage {
    /// Index into per-stage arrays.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Per-stage inputs for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageInput {
    /// The stage before this one holds a valid instruction.
    pub upstream_valid: bool,
    /// This stage holds a valid instruction.
    pub valid: bool,
    /// The stage's own hazard blocks the incoming instruction.
    pub local_hazard: bool,
}

/// Per-stage decisions for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageControl {
    /// The stage refuses the upstream instruction this cycle.
    pub stall: bool,
    /// The stage captures the upstream instruction at the end of this cycle.
    pub enable: bool,
}

/// `stall[n] = (valid[n-1] AND local_hazard[n]) OR (valid[n] AND stall[n+1])`.
pub const fn compute_stall(
    upstream_valid: bool,
    local_hazard: bool,
    valid: bool,
    downstream_stall: bool,
) -> bool {
    (upstream_valid && local_hazard) || (valid && downstream_stall)
}

/// `clock_enable[n] = valid[n-1] AND NOT stall[n]`, gated by the master clock enable.
pub const fn compute_enable(upstream_valid: bool, stall: bool, master_ce: bool) -> bool {
    upstream_valid && !stall && master_ce
}

/// Next-cycle `valid[n]`.
///
/// A clear (or reset) wins; otherwise capturing makes the stage valid, handing the instruction
/// downstream empties it, and anything else holds.
pub const fn next_valid(valid: bool, clear: bool, enable: bool, downstream_enable: bool) -> bool {
    if clear {
        false
    } else if enable {
        true
    } else if downstream_enable {
        false
    } else {
        valid
    }
}

/// Evaluates every controlled stage, last to first.
pub fn evaluate(inputs: &[StageInput; STAGE_COUNT], master_ce: bool) -> [StageControl; STAGE_COUNT] {
    let mut out = [StageControl::default(); STAGE_COUNT];
    let mut downstream_stall = false;
    for n in (0..STAGE_COUNT).rev() {
        let i = inputs[n];
        let stall = compute_stall(i.upstream_valid, i.local_hazard, i.valid, downstream_stall);
        out[n] = StageControl {
            stall,
            enable: compute_enable(i.upstream_valid, stall, master_ce),
        };
        downstream_stall = stall;
    }
    out
}
