//! Privilege Modes.
//!
//! This module defines the two privilege levels of the core. It implements the following:
//! 1. **Mode Classification:** Supervisor (GIE clear) and User (GIE set).
//! 2. **Serialization:** Conversion between the GIE bit and enum variants.
//! 3. **Observability:** Human-readable naming and display formatting for privilege states.

/// Processor privilege mode, selected by the GIE bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Mode {
    /// Supervisor mode (GIE = 0). Interrupts are disabled; entered on reset.
    #[default]
    Supervisor = 0,

    /// User mode (GIE = 1). Interrupts and faults switch back to Supervisor.
    User = 1,
}

impl Mode {
    /// Converts a GIE bit to a mode.
    pub const fn from_gie(gie: bool) -> Self {
        if gie { Self::User } else { Self::Supervisor }
    }

    /// Returns the GIE bit of this mode.
    pub const fn gie(self) -> bool {
        matches!(self, Self::User)
    }

    /// Returns the other mode.
    pub const fn other(self) -> Self {
        match self {
            Self::Supervisor => Self::User,
            Self::User => Self::Supervisor,
        }
    }

    /// Index into per-mode arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the human-readable name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Supervisor => "Supervisor",
            Self::User => "User",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
