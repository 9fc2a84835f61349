//! Common utilities and types used throughout the debug core.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Constants:** Instruction sizes, debug-unit base address, sentinel values.
//! 2. **Error Handling:** Trap representations and the error enums of each subsystem.
//! 3. **Register Management:** A unified interface for GPR and FPR access.

/// Common constants used throughout the core.
pub mod constants;

/// Error types and trap definitions.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use error::{
    BusError, ConfigError, ConsoleError, ControlError, DebugPortError, EventQueueError,
    LoaderError, Trap,
};
pub use reg::RegisterFile;
