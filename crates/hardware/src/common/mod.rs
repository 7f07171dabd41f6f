//! Common types and constants used throughout the core.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Constants:** Register numbering, CC bit layout and instruction constants.
//! 2. **Errors:** Architectural faults and host-facing error types.
//! 3. **Registers:** Register identifiers, their tagged resolution and general storage.

/// Common constants used throughout the core.
pub mod constants;

/// Fault and error types.
pub mod error;

/// Register identifiers and register file.
pub mod reg;

pub use error::{ConfigError, CoreError, Fault, FaultRecord};
pub use reg::{RegId, RegisterFile, RegisterRef};
