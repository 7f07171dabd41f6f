//! Global Core Constants.
//!
//! This module defines the architectural constants shared by every part of the core. It includes:
//! 1. **Register Numbering:** Register counts and the reserved PC/CC slots of each bank.
//! 2. **CC Layout:** Bit positions of the flags and status bits in the condition-code register.
//! 3. **Instruction Constants:** Instruction word size and the default reset vector.

/// Number of register slots per privilege-mode bank (including the PC and CC slots).
pub const REGS_PER_BANK: usize = 16;

/// Total number of register identifiers (two banks of 16).
pub const REG_ID_COUNT: usize = 32;

/// Register number that aliases the condition-code/status register of a bank.
pub const CC_REG_NUM: u8 = 14;

/// Register number that aliases the program counter of a bank.
pub const PC_REG_NUM: u8 = 15;

/// Bit of a 5-bit register identifier selecting the user bank.
pub const REG_USER_BIT: u8 = 0x10;

/// Mask of the register-number part of a 5-bit register identifier.
pub const REG_NUM_MASK: u8 = 0x0F;

/// Size of an instruction word in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Default address the supervisor PC is loaded with on reset.
pub const DEFAULT_RESET_ADDRESS: u32 = 0x0040_0000;

/// Zero flag.
pub const CC_Z: u32 = 1 << 0;
/// Carry flag.
pub const CC_C: u32 = 1 << 1;
/// Negative flag.
pub const CC_N: u32 = 1 << 2;
/// Overflow flag.
pub const CC_V: u32 = 1 << 3;
/// Mask of the four arithmetic flags.
pub const CC_FLAGS_MASK: u32 = CC_Z | CC_C | CC_N | CC_V;

/// Sleep bit: the mode is waiting for an interrupt.
pub const CC_SLEEP: u32 = 1 << 4;
/// General interrupt enable: set in the user CC, clear in the supervisor CC.
pub const CC_GIE: u32 = 1 << 5;
/// Single-step bit (user bank only).
pub const CC_STEP: u32 = 1 << 6;
/// User bank: user-break latch. Supervisor bank: break-enable.
pub const CC_BREAK: u32 = 1 << 7;
/// Illegal-instruction latch.
pub const CC_ILL: u32 = 1 << 8;
/// Trap latch (user bank only).
pub const CC_TRAP: u32 = 1 << 9;
/// Bus-error latch.
pub const CC_BUSERR: u32 = 1 << 10;
/// Divide-error latch.
pub const CC_DIVERR: u32 = 1 << 11;
/// Floating-point-error latch.
pub const CC_FPUERR: u32 = 1 << 12;
/// Halted between the two halves of a compact bundle.
pub const CC_PHASE: u32 = 1 << 13;
