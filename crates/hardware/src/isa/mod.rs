//! Instruction Set Architecture (ISA) Definitions.
//!
//! Opcodes, function codes, decoding and execution of the instructions the core runs:
//! the RV64I base set, Zicsr, and the machine-mode system instructions.
//!
//! * `rv64i`: Base Integer Instruction Set (64-bit).
//! * `privileged`: Trap causes and system opcodes.
//! * `exec`: Executable instruction objects.
//! * `decode`: Instruction word to instruction object.

/// Application Binary Interface (ABI) register name mappings.
pub mod abi;

/// Instruction word to executable object.
pub mod decode;

/// Instruction disassembler for trace records and the console.
pub mod disasm;

/// Executable instruction objects.
pub mod exec;

/// Field extraction and the execution contract.
pub mod instruction;

/// Privileged architecture definitions (trap causes, system instructions).
pub mod privileged;

/// Base integer instruction set (64-bit RISC-V core instructions).
pub mod rv64i;

pub use decode::decode;
pub use instruction::Instruction;
