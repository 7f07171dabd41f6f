//! Pipeline control core library.
//!
//! This crate models the control logic of a five-stage in-order processor pipeline at cycle
//! level. It provides:
//! 1. **Core:** Stage sequencing with valid/stall/clock-enable signals, data hazard detection,
//!    operand forwarding and a single-writer writeback arbiter.
//! 2. **Control:** Supervisor/user mode switching, interrupts, sleep, single step, an atomic
//!    bus lock and a debug/halt port.
//! 3. **Units:** Trait contracts for the decoder, fetch, ALU, memory, divide and
//!    floating-point units, which the host supplies.
//! 4. **Configuration and Statistics:** JSON-loadable feature switches and performance
//!    counters.
//!
//! # Examples
//!
//! ```no_run
//! use pipecore::{Config, Core, CoreInputs};
//! # fn units() -> pipecore::core::units::Units { unimplemented!() }
//!
//! let mut core = Core::new(Config::default(), units())?;
//! for _ in 0..100 {
//!     let out = core.tick(&CoreInputs::default())?;
//!     if out.halted {
//!         break;
//!     }
//! }
//! println!("{}", core.stats());
//! # Ok::<(), pipecore::CoreError>(())
//! ```

/// Common types and constants (register ids, CC layout, faults, errors).
pub mod common;
/// Core configuration (general settings and feature switches).
pub mod config;
/// Pipeline control core (arch state, control, pipeline, units, writeback).
pub mod core;
/// Performance counters.
pub mod stats;

/// Errors returned by the host-facing API.
pub use crate::common::error::{ConfigError, CoreError};
/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// The core and its per-cycle port bundles.
pub use crate::core::{Core, CoreInputs, CoreOutputs};
/// Performance counters.
pub use crate::stats::CoreStats;
