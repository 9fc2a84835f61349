//! Privileged Architecture Definitions.
//!
//! Constants from the RISC-V Privileged Specification used by the machine-mode core.
//!
//! # Modules
//!
//! - `cause`: Exception and Interrupt cause codes.
//! - `opcodes`: System instruction opcodes (ECALL, EBREAK, MRET, CSR access).

/// Exception and interrupt cause code definitions.
pub mod cause;

/// System instruction opcodes and CSR function codes.
pub mod opcodes;
