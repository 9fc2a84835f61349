//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which serves as the container for the
//! entire execution-core state. It coordinates the following:
//! 1. **State Management:** Registers, CSRs, the `pc`/`npc` pair and the run-control state.
//! 2. **Step Loop:** `update_pipeline`, one instruction slot per call (see `execution`).
//! 3. **Debug Integration:** The debug-port slot, breakpoint registry and debug-module state.
//! 4. **System Integration:** System-bus and debug-bus ports, the event queue, haps and trace.

/// Run-control verbs (`go`, `step`, `halt`, `reset`) and haps.
pub mod control;

/// Planting and removing breakpoints through the debug bus.
pub mod breakpoints;

/// Control and Status Register access with side effects.
pub mod csr;

/// The per-step algorithm.
pub mod execution;

/// Memory access through the transaction ports.
pub mod memory;

/// Call/return stack-trace bookkeeping.
pub mod stack_trace;

/// Trap raising and delivery.
pub mod trap;

use std::fmt;

use crate::common::RegisterFile;
use crate::common::Trap;
use crate::common::constants::BUS_MASTER_COUNT;
use crate::config::GeneralConfig;
use crate::core::arch::csr::{CsrFile, DCSR, DCSR_PRV_M, DCSR_XDEBUGVER, MISA, MISA_DEFAULT};
use crate::core::breakpoint::BreakpointRegistry;
use crate::core::events::{EventQueue, ListenerHandle};
use crate::debug::bridge::DebugPortBridge;
use crate::debug::dmi::DmiState;
use crate::debug::regs::BreakpointControl;
use crate::debug::trace::{TraceRecord, TraceSink, TracingTraceSink};
use crate::soc::irq::IrqLines;
use crate::soc::port::MemoryTransactionPort;
use crate::stats::SimStats;

/// Run-control state of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not powered; nothing executes and run-control verbs are rejected.
    #[default]
    Off,
    /// Execution suspended until resumed; debug accesses are still serviced.
    Halted,
    /// Executing until the step budget is reached.
    Stepping,
    /// Free-running.
    Normal,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Halted => "halted",
            Self::Stepping => "stepping",
            Self::Normal => "running",
        };
        f.write_str(s)
    }
}

/// Notification emitted by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hap {
    /// Configuration finished; the simulator emits it once, before the first power-on.
    ConfigDone,
    /// The core entered `Halted`.
    Halt {
        /// Step counter at the halt.
        step: u64,
        /// Program counter at the halt.
        pc: u64,
    },
    /// Reset deasserted from `Off`.
    CpuTurnedOn,
    /// Reset asserted.
    CpuTurnedOff,
}

/// Observer of haps.
pub type HapHandler = Box<dyn FnMut(&Hap) + Send>;

/// Main CPU structure containing all execution-core state.
pub struct Cpu {
    /// General Purpose and Floating Point Registers.
    pub(crate) regs: RegisterFile,
    /// Control and Status Registers (raw storage, side effects applied in `csr`).
    pub(crate) csrs: CsrFile,
    /// Address of the instruction in the current slot.
    pub(crate) pc: u64,
    /// Address of the next slot's instruction.
    pub(crate) npc: u64,
    /// Run-control state.
    pub(crate) state: RunState,

    /// Consumed instruction slots; never decreases.
    pub(crate) step_cnt: u64,
    /// Instructions fetched and executed.
    pub(crate) executed_cnt: u64,
    /// Step counter value at which `Stepping` re-enters `Halted`.
    pub(crate) step_budget: u64,
    /// Slots executed by one `step` request.
    pub(crate) stepping_count: u64,

    /// Set by `set_branch` when the current instruction redirected `npc`.
    pub(crate) branch: bool,
    /// Length of the instruction executed in the current slot.
    pub(crate) oplen: u32,
    /// Last fetched instruction bytes.
    pub(crate) cache_line: [u8; 4],

    /// Address loaded into `pc`/`npc` when reset is deasserted.
    pub(crate) reset_vector: u64,
    /// Halt instead of vectoring to a zero `mtvec`.
    pub(crate) halt_on_unhandled_trap: bool,

    /// System bus for fetch, load and store.
    pub(crate) sysbus: Box<dyn MemoryTransactionPort>,
    /// Dedicated debug bus; the system bus is used when absent.
    pub(crate) dbgbus: Option<Box<dyn MemoryTransactionPort>>,
    /// Reads and writes per bus master.
    pub(crate) bus_util: [BusUtil; BUS_MASTER_COUNT],

    /// Step callbacks.
    pub(crate) events: EventQueue,
    /// Periodic step callbacks of attached devices, re-armed at power-on.
    pub(crate) step_devices: Vec<(ListenerHandle, u64)>,
    /// Single in-flight debug transaction.
    pub(crate) dport: DebugPortBridge,
    /// Debug-module registers (DMI region).
    pub(crate) dmi: DmiState,

    /// Planted breakpoints.
    pub(crate) breakpoints: BreakpointRegistry,
    /// Breakpoint control register.
    pub(crate) br_ctrl: BreakpointControl,
    /// Set by a breakpoint halt; cleared when the next slot is consumed.
    pub(crate) br_hit: bool,
    /// Address of the last breakpoint hit.
    pub(crate) last_br_addr: u64,
    /// Original instruction at the last breakpoint hit.
    pub(crate) last_br_inst: u64,
    /// Breakpoint address to execute through once on resume.
    pub(crate) skip_breakpoint: Option<u64>,

    /// Exception raised by the instruction in the current slot.
    pub(crate) pending_trap: Option<Trap>,
    /// Latched interrupt-pending bits, OR-ed into `mip`.
    pub(crate) irq_latch: u64,
    /// Level-sensitive device interrupt lines, OR-ed into `mip`.
    pub(crate) irq_lines: IrqLines,

    /// Call/return pairs, `stack_trace_size` entries.
    pub(crate) stack_trace_buf: Vec<(u64, u64)>,
    /// Number of pushes not yet popped; may exceed the buffer size.
    pub(crate) stack_trace_cnt: u64,

    /// Receiver of per-instruction trace records.
    pub(crate) trace_sink: Option<Box<dyn TraceSink>>,
    /// Record being filled for the current slot.
    pub(crate) trace_record: TraceRecord,

    /// Hap observers.
    pub(crate) haps: Vec<HapHandler>,
    /// Diagnostic line of the most recent halt.
    pub(crate) last_halt_message: String,
    /// Performance statistics.
    pub(crate) stats: SimStats,
}

/// Bus-utilization counters of one master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusUtil {
    /// Write transactions issued.
    pub writes: u64,
    /// Read transactions issued.
    pub reads: u64,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("npc", &format_args!("{:#x}", self.npc))
            .field("step_cnt", &self.step_cnt)
            .field("breakpoints", &self.breakpoints.len())
            .field("events", &self.events)
            .field("dport", &self.dport)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    /// Creates a powered-off core attached to `sysbus` (and `dbgbus`, if given).
    ///
    /// # Arguments
    ///
    /// * `sysbus` - Port used for instruction fetch, loads and stores.
    /// * `dbgbus` - Port used for breakpoint patching and system-bus access from the debug
    ///   module; `None` routes those through `sysbus`.
    /// * `config` - Run-control settings.
    ///
    /// # Returns
    ///
    /// A `Cpu` in `RunState::Off`; call `reset(false)` to power it on.
    pub fn new(
        sysbus: Box<dyn MemoryTransactionPort>,
        dbgbus: Option<Box<dyn MemoryTransactionPort>>,
        config: &GeneralConfig,
    ) -> Self {
        let mut csrs = CsrFile::default();
        csrs.write(MISA, MISA_DEFAULT);
        csrs.write(DCSR, DCSR_XDEBUGVER | DCSR_PRV_M);

        let trace = cfg!(feature = "always-trace") || config.trace_instructions;
        let trace_sink: Option<Box<dyn TraceSink>> = if trace {
            Some(Box::new(TracingTraceSink))
        } else {
            None
        };

        Self {
            regs: RegisterFile::new(),
            csrs,
            pc: config.reset_vector,
            npc: config.reset_vector,
            state: RunState::Off,
            step_cnt: 0,
            executed_cnt: 0,
            step_budget: 0,
            stepping_count: config.stepping_count,
            branch: false,
            oplen: 0,
            cache_line: [0; 4],
            reset_vector: config.reset_vector,
            halt_on_unhandled_trap: config.halt_on_unhandled_trap,
            sysbus,
            dbgbus,
            bus_util: [BusUtil::default(); BUS_MASTER_COUNT],
            events: EventQueue::new(config.event_queue_limit),
            step_devices: Vec::new(),
            dport: DebugPortBridge::new(),
            dmi: DmiState::default(),
            breakpoints: BreakpointRegistry::new(),
            br_ctrl: BreakpointControl::default(),
            br_hit: false,
            last_br_addr: 0,
            last_br_inst: 0,
            skip_breakpoint: None,
            pending_trap: None,
            irq_latch: 0,
            irq_lines: IrqLines::new(),
            stack_trace_buf: vec![(0, 0); config.stack_trace_size],
            stack_trace_cnt: 0,
            trace_sink,
            trace_record: TraceRecord::default(),
            haps: Vec::new(),
            last_halt_message: String::new(),
            stats: SimStats::default(),
        }
    }

    /// Current run-control state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns `true` in `Normal` or `Stepping`.
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Normal | RunState::Stepping)
    }

    /// Address of the instruction in the current slot.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Address the next slot will execute.
    pub fn npc(&self) -> u64 {
        self.npc
    }

    /// Step counter.
    pub fn step_count(&self) -> u64 {
        self.step_cnt
    }

    /// Executed-instruction counter.
    pub fn executed_count(&self) -> u64 {
        self.executed_cnt
    }

    /// Step counter value at which stepping halts.
    pub fn step_budget(&self) -> u64 {
        self.step_budget
    }

    /// Slots executed per `step` request.
    pub fn stepping_count(&self) -> u64 {
        self.stepping_count
    }

    /// Sets the number of slots executed per `step` request.
    pub fn set_stepping_count(&mut self, count: u64) {
        self.stepping_count = count;
    }

    /// Changes the address loaded on the next power-on.
    pub fn set_reset_vector(&mut self, addr: u64) {
        self.reset_vector = addr;
    }

    /// Address loaded on power-on.
    pub fn reset_vector(&self) -> u64 {
        self.reset_vector
    }

    /// Reads integer register `idx`.
    pub fn read_gpr(&self, idx: usize) -> u64 {
        self.regs.read(idx)
    }

    /// Writes integer register `idx`; the write is recorded in the trace.
    pub fn write_gpr(&mut self, idx: usize, val: u64) {
        self.regs.write(idx, val);
        if idx != 0 && self.trace_sink.is_some() {
            self.trace_record.reg_write = Some((idx, val));
        }
    }

    /// Reads floating-point register `idx` as raw bits.
    pub fn read_fpr(&self, idx: usize) -> u64 {
        self.regs.read_f(idx)
    }

    /// Writes floating-point register `idx` as raw bits.
    pub fn write_fpr(&mut self, idx: usize, val: u64) {
        self.regs.write_f(idx, val);
    }

    /// Register file, for dumps.
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Planted breakpoints.
    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    /// Breakpoint-hit flag (control register bit 1).
    pub fn breakpoint_hit(&self) -> bool {
        self.br_hit
    }

    /// Whether `ebreak` traps instead of halting.
    pub fn trap_on_break(&self) -> bool {
        self.br_ctrl.trap_on_break()
    }

    /// Diagnostic line of the most recent halt; empty before the first one.
    pub fn last_halt_message(&self) -> &str {
        &self.last_halt_message
    }

    /// Pending step callbacks.
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns `true` while a debug transaction waits for service.
    pub fn debug_port_pending(&self) -> bool {
        self.dport.is_pending()
    }

    /// Bus-utilization counters of every master.
    pub fn bus_utilization(&self) -> &[BusUtil; BUS_MASTER_COUNT] {
        &self.bus_util
    }

    /// Run statistics.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Installs (or removes) the trace sink.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace_sink = sink;
    }

    /// Samples `lines` into `mip` from now on.
    pub fn attach_irq_lines(&mut self, lines: IrqLines) {
        self.irq_lines = lines;
    }

    /// Registers a hap observer.
    pub fn add_hap_handler(&mut self, handler: HapHandler) {
        self.haps.push(handler);
    }

    /// Port used by the debug module and breakpoint patching.
    pub fn debug_bus(&mut self) -> &mut dyn MemoryTransactionPort {
        match self.dbgbus.as_mut() {
            Some(bus) => bus.as_mut(),
            None => self.sysbus.as_mut(),
        }
    }

    /// Port used for fetch, load and store.
    pub fn system_bus(&mut self) -> &mut dyn MemoryTransactionPort {
        self.sysbus.as_mut()
    }

    /// Formatted register state for the console.
    pub fn dump_state(&self) -> String {
        format!(
            "state={} pc={:#018x} npc={:#018x} step={} executed={}\n{}",
            self.state,
            self.pc,
            self.npc,
            self.step_cnt,
            self.executed_cnt,
            self.regs.dump()
        )
    }
}
