//! Control logic outside the data path.
//!
//! 1. **Interrupt:** Supervisor/user mode switching, interrupts, sleep and single step.
//! 2. **Lock:** Atomic bus lock sequencing.
//! 3. **Debug:** Debug-port commands, snapshots and the condensed status byte.

/// Debug/halt port types.
pub mod debug;

/// Mode and interrupt controller.
pub mod interrupt;

/// Bus lock controller.
pub mod lock;

pub use self::debug::{DebugCommand, DebugSnapshot, DebugStatus};
pub use self::interrupt::{CcWrite, ModeController, ModeTransition, SwitchContext, SwitchReason};
pub use self::lock::{LockController, LockState};
