//! System-wide constants.
//!
//! Values shared between the execution core, the debug support unit map, and the
//! system bus. Anything that must stay bit-exact with external tooling lives here.

/// Number of bytes fetched per instruction line.
pub const FETCH_LINE_BYTES: usize = 4;

/// Length in bytes of an uncompressed instruction.
pub const INSTRUCTION_SIZE_32: u32 = 4;

/// Length in bytes of a compressed instruction.
pub const INSTRUCTION_SIZE_16: u32 = 2;

/// Base physical address of the Debug Support Unit register block.
pub const DSU_BASE: u64 = 0x8008_0000;

/// Sentinel returned by register-name lookups that miss.
pub const REG_ADDR_ERROR: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Number of CSR slots addressable through the debug port.
pub const CSR_COUNT: usize = 4096;

/// Number of integer registers.
pub const GPR_COUNT: usize = 32;

/// Number of floating-point registers.
pub const FPR_COUNT: usize = 32;

/// Number of bus masters tracked by the bus-utilization counters.
pub const BUS_MASTER_COUNT: usize = 2;

/// Reason string used when `halt` is called without one.
pub const DEFAULT_HALT_REASON: &str = "CPU halted";

/// Byte size of one DSU region (4096 eight-byte slots).
pub const DSU_REGION_SIZE: u64 = 0x8000;

/// Number of DSU regions.
pub const DSU_REGION_COUNT: u32 = 4;

/// Region 1 slot holding the stack-trace count.
pub const STACK_TRACE_CNT_INDEX: u64 = 64;

/// First region 1 slot of the stack-trace buffer.
pub const STACK_TRACE_BUF_INDEX: u64 = 128;

/// Hart number reported by `mhartid` and the control register.
pub const CORE_ID: u64 = 0;
