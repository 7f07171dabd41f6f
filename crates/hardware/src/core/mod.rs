//! Pipeline control core.
//!
//! This module contains the control logic of the five-stage pipeline and the contracts of
//! the units it drives. It includes:
//! 1. **Architecture:** Privilege modes, per-mode status and the architectural state.
//! 2. **Control:** Mode switching, interrupts, bus locking and the debug port.
//! 3. **Core:** The per-cycle orchestration (`Core::tick`).
//! 4. **Pipeline:** Stage latches, hazards, the scoreboard and the stage sequencer.
//! 5. **Units:** Trait interfaces of the decoder, fetch, ALU, memory, divide and FPU.
//! 6. **Writeback:** The single-writer commit arbiter.

/// Architectural state (register file, PCs, CC contents, privilege mode).
pub mod arch;

/// Mode/interrupt controller, bus lock controller and debug port.
pub mod control;

/// Core definition and per-cycle execution.
pub mod cpu;

/// Pipeline control structures (latches, hazards, scoreboard, sequencer, signals).
pub mod pipeline;

/// Collaborator unit interfaces.
pub mod units;

/// Writeback arbitration and commit.
pub mod writeback;

pub use self::cpu::{Core, CoreInputs, CoreOutputs};
