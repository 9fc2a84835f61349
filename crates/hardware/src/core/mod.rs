//! Core processor implementation.
//!
//! This module contains the execution core and the collaborators it owns: the architectural
//! register state, the step-callback queue and the breakpoint registry.

/// Architecture-specific components (CSRs, register files).
pub mod arch;

/// Address-keyed breakpoint records.
pub mod breakpoint;

/// CPU core implementation and the step loop.
pub mod cpu;

/// Step-ordered callback queue.
pub mod events;

pub use self::cpu::{Cpu, Hap, RunState};
