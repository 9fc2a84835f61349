//! RISC-V architecture-specific components.
//!
//! This module contains the architectural state of the core:
//! 1. **CSRs:** Control and Status Register definitions and flat storage.
//! 2. **FPRs:** Floating-point register mirror.
//! 3. **GPRs:** General-purpose register file.

/// Control and Status Register (CSR) definitions and storage.
pub mod csr;

/// Floating-point register mirror.
pub mod fpr;

/// General-Purpose Register file implementation.
pub mod gpr;
