//! Text command console.
//!
//! Parses one command line at a time and drives the core the way an external debugger would:
//! register and breakpoint accesses travel as debug-port transactions to DSU addresses, memory
//! goes through the debug module's system-bus access, and run-control verbs call the core.
//! Every result, error included, comes back as a single piece of text for the caller to print.
//!
//! | Command                  | Effect                                         |
//! |--------------------------|------------------------------------------------|
//! | `halt`, `stop`, `break`  | halt the core                                  |
//! | `go`, `run`, `c`         | resume                                         |
//! | `step [n]`               | execute `n` (default: stepping count) slots    |
//! | `reg <name> [value]`     | read or write a DSU register by name           |
//! | `br`                     | list breakpoints                               |
//! | `br add <addr> [hw]`     | plant a software (or hardware) breakpoint      |
//! | `br rm <addr>`           | remove a breakpoint                            |
//! | `mem <addr> [len]`       | hex dump through system-bus access             |
//! | `disas <addr> [count]`   | disassemble through system-bus access          |
//! | `status`                 | run state, counters and last halt line         |
//! | `reset`                  | power-cycle the core                           |

use std::fmt::Write as _;
use std::sync::mpsc;

use crate::common::ConsoleError;
use crate::common::constants::{DSU_BASE, REG_ADDR_ERROR};
use crate::core::breakpoint::BreakpointKind;
use crate::core::{Cpu, RunState};
use crate::debug::bridge::{DebugPortTransaction, ResponseCallback};
use crate::debug::dsu::{DsuMap, control, dmi, region};
use crate::debug::regs::{DsuControl, Dmcontrol, Sbcs};
use crate::isa::decode::instruction_length;
use crate::isa::disasm::disassemble;

/// Steps the console runs the core while waiting for a debug-port response.
const RESPONSE_WAIT_STEPS: u64 = 16;
/// Default `mem` length in bytes.
const DEFAULT_DUMP_LEN: u64 = 64;
/// Default `disas` instruction count.
const DEFAULT_DISAS_COUNT: u64 = 8;
/// Bytes per `mem` output line.
const DUMP_LINE: usize = 16;

/// Parses `0x`-prefixed hex or decimal.
pub fn parse_number(s: &str) -> Result<u64, ConsoleError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|_| ConsoleError::InvalidNumber(s.to_string()))
}

/// Command interpreter bound to one DSU instance.
#[derive(Debug, Clone)]
pub struct Console {
    dsu: DsuMap,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(DSU_BASE)
    }
}

impl Console {
    /// Creates a console for a DSU mapped at `dsu_base`.
    pub fn new(dsu_base: u64) -> Self {
        Self {
            dsu: DsuMap::new(dsu_base),
        }
    }

    /// Register map used for name lookups.
    pub fn dsu(&self) -> &DsuMap {
        &self.dsu
    }

    /// Executes one command line against `cpu`.
    ///
    /// # Returns
    ///
    /// The text to print, possibly empty.
    ///
    /// # Errors
    ///
    /// A `ConsoleError` describing why the command failed; its display text is the line to
    /// print.
    pub fn execute(&mut self, cpu: &mut Cpu, line: &str) -> Result<String, ConsoleError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = words.split_first() else {
            return Err(ConsoleError::Malformed(line.to_string()));
        };
        tracing::debug!(command = line.trim(), "console");

        match cmd.to_ascii_lowercase().as_str() {
            "halt" | "stop" | "break" => {
                cpu.halt(None)?;
                Ok(cpu.last_halt_message().to_string())
            }
            "go" | "run" | "c" => {
                cpu.go()?;
                Ok(String::new())
            }
            "step" => self.step(cpu, args),
            "reg" => self.reg(cpu, args),
            "br" => self.breakpoint(cpu, args),
            "mem" => self.mem(cpu, args),
            "disas" => self.disas(cpu, args),
            "status" => Ok(status(cpu)),
            "reset" => {
                cpu.reset(true);
                cpu.reset(false);
                Ok(format!("reset, pc={:#x}", cpu.pc()))
            }
            "help" => Ok(self.help()),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }

    fn step(&mut self, cpu: &mut Cpu, args: &[&str]) -> Result<String, ConsoleError> {
        match args {
            [] => cpu.step()?,
            [n] => cpu.step_by(parse_number(n)?)?,
            _ => return Err(ConsoleError::Malformed(format!("step {}", args.join(" ")))),
        }
        while cpu.state() == RunState::Stepping {
            let _ = cpu.update_pipeline();
        }
        Ok(cpu.last_halt_message().to_string())
    }

    fn reg(&mut self, cpu: &mut Cpu, args: &[&str]) -> Result<String, ConsoleError> {
        let (name, value) = match args {
            [name] => (*name, None),
            [name, value] => (*name, Some(parse_number(value)?)),
            _ => return Err(ConsoleError::Malformed(format!("reg {}", args.join(" ")))),
        };
        let addr = self.dsu.reg_addr(name);
        if addr == REG_ADDR_ERROR {
            return Err(ConsoleError::RegisterNotFound(name.to_string()));
        }
        let (region, index) = self
            .dsu
            .decode(addr)
            .ok_or_else(|| ConsoleError::RegisterNotFound(name.to_string()))?;

        match value {
            Some(v) => {
                transact(cpu, DebugPortTransaction::write(region, index, v))?;
                Ok(String::new())
            }
            None => {
                let v = transact(cpu, DebugPortTransaction::read(region, index))?;
                Ok(format!("{name} = {v:#018x}"))
            }
        }
    }

    fn breakpoint(&mut self, cpu: &mut Cpu, args: &[&str]) -> Result<String, ConsoleError> {
        let (index, addr, kind) = match args {
            [] => return Ok(list_breakpoints(cpu)),
            ["add", addr] => (control::ADD_BREAKPOINT, parse_number(addr)?, BreakpointKind::Software),
            ["add", addr, "hw"] => (
                control::ADD_HW_BREAKPOINT,
                parse_number(addr)?,
                BreakpointKind::Hardware,
            ),
            ["rm", addr] => (control::REMOVE_BREAKPOINT, parse_number(addr)?, BreakpointKind::Software),
            _ => return Err(ConsoleError::Malformed(format!("br {}", args.join(" ")))),
        };

        let removing = index == control::REMOVE_BREAKPOINT;
        if removing && !cpu.breakpoints().contains(addr) {
            return Err(ConsoleError::BreakpointRejected(addr));
        }

        let resume = cpu.state();
        let remaining = cpu.step_budget().saturating_sub(cpu.step_count());
        if cpu.is_running() {
            let mut halt = DsuControl(0);
            halt.set_halt(true);
            transact(cpu, DebugPortTransaction::write(region::CONTROL, control::CONTROL, halt.0))?;
        }
        transact(cpu, DebugPortTransaction::write(region::CONTROL, index, addr))?;
        match resume {
            RunState::Stepping => cpu.step_by(remaining)?,
            RunState::Normal => {
                transact(cpu, DebugPortTransaction::write(region::CONTROL, control::CONTROL, 0))?;
            }
            RunState::Halted | RunState::Off => {}
        }

        let planted = cpu.breakpoints().get(addr).map(|bp| bp.kind);
        match (removing, planted) {
            (true, None) => Ok(format!("breakpoint removed at {addr:#x}")),
            (false, Some(k)) if k == kind => Ok(format!("{kind} breakpoint set at {addr:#x}")),
            _ => Err(ConsoleError::BreakpointRejected(addr)),
        }
    }

    fn mem(&mut self, cpu: &mut Cpu, args: &[&str]) -> Result<String, ConsoleError> {
        let (addr, len) = match args {
            [addr] => (parse_number(addr)?, DEFAULT_DUMP_LEN),
            [addr, len] => (parse_number(addr)?, parse_number(len)?),
            _ => return Err(ConsoleError::Malformed(format!("mem {}", args.join(" ")))),
        };
        let bytes = sb_read_bytes(cpu, addr, len)?;

        let mut out = String::new();
        for (i, chunk) in bytes.chunks(DUMP_LINE).enumerate() {
            let _ = write!(out, "{:016x}:", addr + (i * DUMP_LINE) as u64);
            for b in chunk {
                let _ = write!(out, " {b:02x}");
            }
            out.push('\n');
        }
        out.pop();
        Ok(out)
    }

    fn disas(&mut self, cpu: &mut Cpu, args: &[&str]) -> Result<String, ConsoleError> {
        let (mut addr, count) = match args {
            [addr] => (parse_number(addr)?, DEFAULT_DISAS_COUNT),
            [addr, count] => (parse_number(addr)?, parse_number(count)?),
            _ => return Err(ConsoleError::Malformed(format!("disas {}", args.join(" ")))),
        };
        let mut lines = Vec::new();
        for _ in 0..count {
            let bytes = sb_read_bytes(cpu, addr, 4)?;
            let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let len = instruction_length(raw);
            let raw = if len == 2 { raw & 0xFFFF } else { raw };
            let marker = if cpu.breakpoints().contains(addr) { '*' } else { ' ' };
            lines.push(format!("{marker}{addr:016x}: {raw:08x}  {}", disassemble(raw)));
            addr += u64::from(len);
        }
        Ok(lines.join("\n"))
    }

    fn help(&self) -> String {
        let mut out = String::from(
            "halt|stop|break, go|run|c, step [n], reg <name> [value], br [add <addr> [hw] | rm <addr>],\n\
             mem <addr> [len], disas <addr> [count], status, reset\nregisters:",
        );
        for name in DsuMap::names() {
            out.push(' ');
            out.push_str(name);
        }
        out
    }
}

/// Submits `trans` and runs the core until the response arrives.
fn transact(cpu: &mut Cpu, trans: DebugPortTransaction) -> Result<u64, ConsoleError> {
    let (tx, rx) = mpsc::channel();
    let callback: ResponseCallback = Box::new(move |t| {
        let _ = tx.send(t.rdata);
    });
    cpu.submit_debug(trans, callback)
        .map_err(|_| ConsoleError::PortBusy)?;
    for _ in 0..RESPONSE_WAIT_STEPS {
        if let Ok(v) = rx.try_recv() {
            return Ok(v);
        }
        let _ = cpu.update_pipeline();
    }
    rx.try_recv()
        .map_err(|_| ConsoleError::NoResponse(RESPONSE_WAIT_STEPS))
}

/// Reads `len` bytes at `addr` with byte-wide, auto-incrementing system-bus access.
fn sb_read_bytes(cpu: &mut Cpu, addr: u64, len: u64) -> Result<Vec<u8>, ConsoleError> {
    let mut dmcontrol = Dmcontrol(0);
    dmcontrol.set_dmactive(true);
    let dmcontrol = u64::from(dmcontrol.0);
    transact(cpu, DebugPortTransaction::write(region::DMI, dmi::DMCONTROL, dmcontrol))?;

    write_sbcs(cpu, true, len > 1)?;
    transact(cpu, DebugPortTransaction::write(region::DMI, dmi::SBADDRESS0, addr))?;

    let mut bytes = Vec::new();
    for i in 0..len {
        if len > 1 && i + 1 == len {
            // The last read must not fetch past the end of the range.
            write_sbcs(cpu, false, false)?;
        }
        let v = transact(cpu, DebugPortTransaction::read(region::DMI, dmi::SBDATA0))?;
        bytes.push(v as u8);
    }

    let status = transact(cpu, DebugPortTransaction::read(region::DMI, dmi::SBCS))?;
    let err = Sbcs(status as u32).sberror();
    if err != 0 {
        return Err(ConsoleError::SystemBus(u64::from(err), addr));
    }
    Ok(bytes)
}

fn write_sbcs(cpu: &mut Cpu, clear_error: bool, read_on_data: bool) -> Result<u64, ConsoleError> {
    let mut sbcs = Sbcs(0);
    if clear_error {
        sbcs.set_sberror(0b111);
    }
    sbcs.set_sbaccess(0);
    sbcs.set_sbreadonaddr(true);
    sbcs.set_sbautoincrement(true);
    sbcs.set_sbreadondata(read_on_data);
    transact(cpu, DebugPortTransaction::write(region::DMI, dmi::SBCS, u64::from(sbcs.0)))
}

fn list_breakpoints(cpu: &Cpu) -> String {
    if cpu.breakpoints().is_empty() {
        return "no breakpoints".to_string();
    }
    cpu.breakpoints()
        .iter()
        .map(|bp| format!("{:#018x} {} {:#x}", bp.addr, bp.kind, bp.original_word()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn status(cpu: &Cpu) -> String {
    let mut out = format!(
        "state: {}\npc: {:#018x}\nnpc: {:#018x}\nsteps: {}\nexecuted: {}\nbreakpoints: {}",
        cpu.state(),
        cpu.pc(),
        cpu.npc(),
        cpu.step_count(),
        cpu.executed_count(),
        cpu.breakpoints().len()
    );
    if !cpu.last_halt_message().is_empty() {
        let _ = write!(out, "\nlast halt: {}", cpu.last_halt_message());
    }
    out
}
