//! Trap and error definitions.
//!
//! This module defines the error handling of the core. It provides:
//! 1. **Trap Representation:** Synchronous exceptions and asynchronous interrupts, carried by value.
//! 2. **Subsystem Errors:** `thiserror` enums for run-control, the debug port, the bus,
//!    the event queue, configuration, the loader, and the text console.
//!
//! Traps never travel through `Err`; they are folded into trap delivery by the core.
//! Only `ControlError::NotPowered` and register lookup misses reach the console as text.

use std::fmt;

use thiserror::Error;

use crate::debug::bridge::{DebugPortTransaction, ResponseCallback};

/// RISC-V trap types representing exceptions and interrupts.
///
/// Only machine mode is modeled; every trap is taken into M-mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Instruction address misaligned exception. Carries the misaligned target.
    InstructionAddressMisaligned(u64),
    /// Instruction fetch hit an unmapped or failing address.
    InstructionAccessFault(u64),
    /// Illegal instruction exception. Carries the instruction encoding.
    IllegalInstruction(u32),
    /// Breakpoint exception (`ebreak`). Carries the program counter.
    Breakpoint(u64),
    /// Load address misaligned exception.
    LoadAddressMisaligned(u64),
    /// Load access fault exception.
    LoadAccessFault(u64),
    /// Store address misaligned exception.
    StoreAddressMisaligned(u64),
    /// Store access fault exception.
    StoreAccessFault(u64),
    /// Environment call from machine mode.
    EnvironmentCallFromMMode,
    /// Machine software interrupt.
    MachineSoftwareInterrupt,
    /// Machine timer interrupt.
    MachineTimerInterrupt,
    /// Machine external interrupt.
    MachineExternalInterrupt,
}

impl Trap {
    /// Returns the `mcause` encoding of this trap (interrupt bit in the MSB).
    pub fn cause(&self) -> u64 {
        use crate::isa::privileged::cause::{exception, interrupt};
        match self {
            Self::InstructionAddressMisaligned(_) => exception::INSTRUCTION_ADDRESS_MISALIGNED,
            Self::InstructionAccessFault(_) => exception::INSTRUCTION_ACCESS_FAULT,
            Self::IllegalInstruction(_) => exception::ILLEGAL_INSTRUCTION,
            Self::Breakpoint(_) => exception::BREAKPOINT,
            Self::LoadAddressMisaligned(_) => exception::LOAD_ADDRESS_MISALIGNED,
            Self::LoadAccessFault(_) => exception::LOAD_ACCESS_FAULT,
            Self::StoreAddressMisaligned(_) => exception::STORE_ADDRESS_MISALIGNED,
            Self::StoreAccessFault(_) => exception::STORE_ACCESS_FAULT,
            Self::EnvironmentCallFromMMode => exception::ENVIRONMENT_CALL_FROM_M_MODE,
            Self::MachineSoftwareInterrupt => interrupt::MACHINE_SOFTWARE,
            Self::MachineTimerInterrupt => interrupt::MACHINE_TIMER,
            Self::MachineExternalInterrupt => interrupt::MACHINE_EXTERNAL,
        }
    }

    /// Returns the value written to `mtval` when this trap is taken.
    pub fn tval(&self) -> u64 {
        match self {
            Self::InstructionAddressMisaligned(v)
            | Self::InstructionAccessFault(v)
            | Self::Breakpoint(v)
            | Self::LoadAddressMisaligned(v)
            | Self::LoadAccessFault(v)
            | Self::StoreAddressMisaligned(v)
            | Self::StoreAccessFault(v) => *v,
            Self::IllegalInstruction(inst) => u64::from(*inst),
            _ => 0,
        }
    }

    /// Returns `true` for asynchronous interrupts.
    pub fn is_interrupt(&self) -> bool {
        self.cause() >> 63 == 1
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstructionAddressMisaligned(addr) => {
                write!(f, "InstructionAddressMisaligned({addr:#x})")
            }
            Self::InstructionAccessFault(addr) => write!(f, "InstructionAccessFault({addr:#x})"),
            Self::IllegalInstruction(inst) => write!(f, "IllegalInstruction({inst:#x})"),
            Self::Breakpoint(pc) => write!(f, "Breakpoint({pc:#x})"),
            Self::LoadAddressMisaligned(addr) => write!(f, "LoadAddressMisaligned({addr:#x})"),
            Self::LoadAccessFault(addr) => write!(f, "LoadAccessFault({addr:#x})"),
            Self::StoreAddressMisaligned(addr) => write!(f, "StoreAddressMisaligned({addr:#x})"),
            Self::StoreAccessFault(addr) => write!(f, "StoreAccessFault({addr:#x})"),
            Self::EnvironmentCallFromMMode => write!(f, "EnvironmentCallFromMMode"),
            Self::MachineSoftwareInterrupt => write!(f, "MachineSoftwareInterrupt"),
            Self::MachineTimerInterrupt => write!(f, "MachineTimerInterrupt"),
            Self::MachineExternalInterrupt => write!(f, "MachineExternalInterrupt"),
        }
    }
}

impl std::error::Error for Trap {}

/// Run-control rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    /// A run-control verb was issued while the core is powered off.
    #[error("CPU is turned-off")]
    NotPowered,
}

/// Failure of a single memory transaction on a `MemoryTransactionPort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// No device claims the address.
    #[error("no device mapped at {0:#x}")]
    Unmapped(u64),
    /// The access crosses a device boundary or is not naturally aligned.
    #[error("misaligned {size}-byte access at {addr:#x}")]
    Misaligned {
        /// Start address of the access.
        addr: u64,
        /// Access width in bytes.
        size: usize,
    },
    /// The access width is not 1, 2, 4 or 8 bytes.
    #[error("unsupported access width {0}")]
    Unsupported(usize),
}

/// Rejection of a debug-port submission.
#[derive(Error)]
pub enum DebugPortError {
    /// A transaction is already pending; the rejected one is handed back untouched.
    #[error("debug port busy: transaction to region {} index {:#x} rejected", .0.region, .0.addr)]
    Busy(Box<DebugPortTransaction>, ResponseCallback),
}

impl fmt::Debug for DebugPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy(trans, _) => f.debug_tuple("Busy").field(trans).finish_non_exhaustive(),
        }
    }
}

/// Event queue insertion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventQueueError {
    /// The configured bound on pending callbacks is reached.
    #[error("event queue capacity of {0} callbacks exceeded")]
    CapacityExceeded(usize),
}

/// Configuration parse failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document is malformed or has fields of the wrong type.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Image loading failure.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("could not read '{path}': {source}")]
    Io {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file looked like ELF but could not be parsed.
    #[error("malformed ELF image: {0}")]
    Elf(#[from] object::read::Error),
    /// A segment landed on an address no device accepts.
    #[error("segment at {addr:#x} could not be written: {source}")]
    Placement {
        /// Target address of the segment.
        addr: u64,
        /// Bus error reported by the write.
        #[source]
        source: BusError,
    },
}

/// Errors reported on the text console channel.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Empty or syntactically broken command line.
    #[error("malformed command: {0}")]
    Malformed(String),
    /// First word is not a known command.
    #[error("unknown command '{0}'")]
    Unknown(String),
    /// Register name does not appear in the debug support unit map.
    #[error("register '{0}' not found")]
    RegisterNotFound(String),
    /// A numeric argument did not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    /// Run-control verb rejected by the core.
    #[error(transparent)]
    Control(#[from] ControlError),
    /// The debug port refused the transaction.
    #[error("debug port busy")]
    PortBusy,
    /// The debug port never answered within the step budget the console waits for.
    #[error("no debug-port response after {0} steps")]
    NoResponse(u64),
    /// The core refused to plant or remove a breakpoint at the address.
    #[error("breakpoint at {0:#x} rejected")]
    BreakpointRejected(u64),
    /// A system-bus access issued through the debug module failed.
    #[error("system bus error {0} at {1:#x}")]
    SystemBus(u64, u64),
}
