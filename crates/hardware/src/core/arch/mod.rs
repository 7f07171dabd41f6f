//! Architectural components of the core.
//!
//! This module contains the software-visible elements of the processor.
//! It includes the following modules:
//! 1. **Modes:** The Supervisor/User privilege bit.
//! 2. **Status:** Per-mode condition codes, status bits and sticky fault latches.
//! 3. **State:** The single owned struct holding registers, PCs, CCs and the mode.

/// Privilege mode definitions.
pub mod mode;

/// Architectural state (register file, PCs, CC contents, mode).
pub mod state;

/// Condition codes, status bits and sticky flags.
pub mod status;

pub use mode::Mode;
pub use state::ArchState;
pub use status::{CcWriter, ModeStatus, StickyFlag};
