//! Faults and Error definitions.
//!
//! This module defines the two distinct failure channels of the core. It provides:
//! 1. **Architectural Faults:** `Fault` and `FaultRecord`, conditions the modelled processor
//!    latches into its status registers. These are program behaviour, not Rust errors.
//! 2. **Host Errors:** `CoreError` and `ConfigError`, misuse of the library itself (bad
//!    configuration, missing collaborator units, debug-port contract violations).

use std::fmt;

use thiserror::Error;

use crate::core::arch::mode::Mode;

/// Architectural fault classes, each latched per privilege mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    /// The decoder or fetch unit flagged the instruction as illegal, or it needs an
    /// optional unit that is not present.
    IllegalInstruction,
    /// The memory unit reported a bus error.
    BusError,
    /// The divide unit reported division by zero.
    DivideByZero,
    /// The floating-point unit reported an exception.
    FloatingPointError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IllegalInstruction => "IllegalInstruction",
            Self::BusError => "BusError",
            Self::DivideByZero => "DivideByZero",
            Self::FloatingPointError => "FloatingPointError",
        };
        f.write_str(name)
    }
}

/// The most recent fault and where it happened, readable through the debug port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultRecord {
    /// Fault class.
    pub fault: Fault,
    /// Mode the faulting instruction executed in.
    pub mode: Mode,
    /// Address of the faulting instruction.
    pub pc: u32,
    /// Bus address for bus errors, otherwise `None`.
    pub addr: Option<u32>,
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} mode at pc={:#010x}", self.fault, self.mode, self.pc)?;
        if let Some(addr) = self.addr {
            write!(f, " (addr={addr:#010x})")?;
        }
        Ok(())
    }
}

/// Errors raised while loading or validating the core configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for [`crate::config::Config`].
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A field holds a value the core cannot run with.
    #[error("invalid configuration field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

/// Errors raised by the host-facing API of the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A debug write arrived while the core was not fully halted.
    #[error("debug write to {reg} rejected: core is not halted")]
    DebugWriteWhileRunning {
        /// Target of the rejected write.
        reg: crate::common::reg::RegId,
    },
    /// The configuration enables an optional unit that was not supplied.
    #[error("configuration enables the {0} unit but none was supplied")]
    MissingUnit(&'static str),
    /// A register identifier does not fit in five bits.
    #[error("invalid register identifier {0:#x}")]
    InvalidRegister(u8),
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
