//! RISC-V functional execution core with a debug-port and run-control protocol.
//!
//! This crate implements a step-driven RISC-V core that an external debugger controls through
//! a memory-mapped Debug Support Unit. It provides the following:
//! 1. **Core:** The run-control state machine (`Off`, `Halted`, `Stepping`, `Normal`), the
//!    per-step fetch/decode/execute cycle, trap delivery and breakpoints.
//! 2. **Events:** A step-ordered callback queue for time-based collaborators.
//! 3. **Debug:** The single-slot debug-port bridge, DSU register regions, the RISC-V debug
//!    module subset, trace sinks and the text command console.
//! 4. **ISA:** Decoding, execution and disassembly of an RV64I subset with Zicsr.
//! 5. **SoC:** The memory transaction port, system bus, RAM and UART.
//! 6. **Simulation:** Configuration, image loading, the composition root and statistics.

/// Common types and constants (sentinels, registers, traps, errors).
pub mod common;
/// Simulator configuration deserialized from JSON.
pub mod config;
/// Execution core (state machine, events, breakpoints, architectural state).
pub mod core;
/// Debugger-facing components (debug port, DSU, debug module, console, trace).
pub mod debug;
/// Instruction set (decode, execute, disassemble).
pub mod isa;
/// Image loading and the composition root.
pub mod sim;
/// System-on-chip (transaction port, bus, devices).
pub mod soc;
/// Run statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Execution core and its run state.
pub use crate::core::{Cpu, Hap, RunState};
/// Composition root.
pub use crate::sim::Simulator;
