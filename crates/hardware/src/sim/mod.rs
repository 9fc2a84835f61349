//! Simulation setup.
//!
//! Provides the composition root that wires the core to its bus and console, and the loader
//! that places program images in memory.

/// ELF and raw image loading.
pub mod loader;

/// Composition root and step-loop driver.
pub mod simulator;

pub use simulator::Simulator;
