//! Configuration system for the debug core.
//!
//! This module defines the configuration structures used to parameterize the core and the
//! system it is attached to. It provides:
//! 1. **Defaults:** Baseline constants (reset vector, stepping count, memory map).
//! 2. **Structures:** Hierarchical config for general run-control options and the system map.
//! 3. **Parsing:** `Config::from_json` for configuration files supplied by the CLI.

use serde::Deserialize;

use crate::common::ConfigError;
use crate::common::constants::DSU_BASE;

/// Default configuration constants.
///
/// These values define the baseline configuration when not explicitly overridden in the
/// JSON configuration document.
mod defaults {
    /// Address the core starts fetching from when reset is deasserted.
    pub const RESET_VECTOR: u64 = 0x8000_0000;

    /// Number of instruction slots executed per `step` request.
    pub const STEPPING_COUNT: u64 = 1;

    /// Capacity of the call/return stack-trace buffer, in entries.
    pub const STACK_TRACE_SIZE: usize = 64;

    /// Base address of main system RAM.
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Size of main system RAM (512 KiB).
    ///
    /// RAM must end at or below the DSU window at `RAM_BASE + 0x80000`.
    pub const RAM_SIZE: usize = 512 * 1024;

    /// Base address of the UART transmit register block.
    pub const UART_BASE: u64 = 0x1000_0000;

    /// Base address of the CLINT timer registers.
    pub const CLINT_BASE: u64 = 0x0200_0000;

    /// CLINT timer divider (mtime increments every N steps).
    pub const CLINT_DIVIDER: u64 = 10;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use rvdbg_core::config::Config;
///
/// let json = r#"{
///     "general": { "stepping_count": 4, "trace_instructions": true },
///     "system": { "ram_size": 65536 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.stepping_count, 4);
/// assert!(config.general.trace_instructions);
/// assert_eq!(config.system.ram_size, 65536);
/// assert_eq!(config.general.reset_vector, 0x8000_0000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Run-control and diagnostic settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// System memory map.
    #[serde(default)]
    pub system: SystemConfig,
}

impl Config {
    /// Parses a configuration from a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` when the document is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Run-control and diagnostic settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// PC loaded into `pc`/`npc` when reset is deasserted.
    #[serde(default = "GeneralConfig::default_reset_vector")]
    pub reset_vector: u64,

    /// Instruction slots executed by one `step` request.
    #[serde(default = "GeneralConfig::default_stepping_count")]
    pub stepping_count: u64,

    /// Capacity of the stack-trace buffer (entries, each two words).
    #[serde(default = "GeneralConfig::default_stack_trace_size")]
    pub stack_trace_size: usize,

    /// Emit a trace record per executed instruction through the `tracing` sink.
    #[serde(default)]
    pub trace_instructions: bool,

    /// Halt instead of vectoring when a trap is raised while `mtvec` is zero.
    #[serde(default = "GeneralConfig::default_halt_on_unhandled_trap")]
    pub halt_on_unhandled_trap: bool,

    /// Upper bound on pending step callbacks; `None` grows without limit.
    #[serde(default)]
    pub event_queue_limit: Option<usize>,
}

impl GeneralConfig {
    fn default_reset_vector() -> u64 {
        defaults::RESET_VECTOR
    }

    fn default_stepping_count() -> u64 {
        defaults::STEPPING_COUNT
    }

    fn default_stack_trace_size() -> usize {
        defaults::STACK_TRACE_SIZE
    }

    fn default_halt_on_unhandled_trap() -> bool {
        true
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            reset_vector: defaults::RESET_VECTOR,
            stepping_count: defaults::STEPPING_COUNT,
            stack_trace_size: defaults::STACK_TRACE_SIZE,
            trace_instructions: false,
            halt_on_unhandled_trap: true,
            event_queue_limit: None,
        }
    }
}

/// System memory map.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// RAM base address
    #[serde(default = "SystemConfig::default_ram_base")]
    pub ram_base: u64,

    /// RAM size in bytes
    #[serde(default = "SystemConfig::default_ram_size")]
    pub ram_size: usize,

    /// UART base address
    #[serde(default = "SystemConfig::default_uart_base")]
    pub uart_base: u64,

    /// Debug Support Unit base address
    #[serde(default = "SystemConfig::default_dsu_base")]
    pub dsu_base: u64,

    /// CLINT (timer) MMIO base address
    #[serde(default = "SystemConfig::default_clint_base")]
    pub clint_base: u64,

    /// CLINT timer divider (mtime increments every N steps)
    #[serde(default = "SystemConfig::default_clint_divider")]
    pub clint_divider: u64,
}

impl SystemConfig {
    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_ram_size() -> usize {
        defaults::RAM_SIZE
    }

    fn default_uart_base() -> u64 {
        defaults::UART_BASE
    }

    fn default_dsu_base() -> u64 {
        DSU_BASE
    }

    fn default_clint_base() -> u64 {
        defaults::CLINT_BASE
    }

    fn default_clint_divider() -> u64 {
        defaults::CLINT_DIVIDER
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            uart_base: defaults::UART_BASE,
            dsu_base: DSU_BASE,
            clint_base: defaults::CLINT_BASE,
            clint_divider: defaults::CLINT_DIVIDER,
        }
    }
}
