//! Per-step trace records.
//!
//! The core fills one `TraceRecord` per executed instruction and hands it to a `TraceSink`.
//! Sinks are write-only; the core never reads anything back.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::isa::disasm::disassemble;

/// Memory operation performed by a traced instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemOp {
    /// Effective address.
    pub addr: u64,
    /// Access width in bytes.
    pub size: usize,
    /// `true` for stores.
    pub write: bool,
    /// Value stored or loaded (before sign extension).
    pub value: u64,
}

/// What one instruction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceRecord {
    /// Step counter value of the slot.
    pub step: u64,
    /// Instruction address.
    pub pc: u64,
    /// Instruction word as fetched.
    pub raw: u32,
    /// Integer register written, with its new value.
    pub reg_write: Option<(usize, u64)>,
    /// Load or store performed.
    pub mem: Option<MemOp>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:016x}: {:08x}  {:<28}",
            self.step,
            self.pc,
            self.raw,
            disassemble(self.raw)
        )?;
        if let Some((rd, val)) = self.reg_write {
            write!(f, " x{rd}={val:#x}")?;
        }
        if let Some(m) = self.mem {
            let dir = if m.write { "st" } else { "ld" };
            write!(f, " {dir}[{:#x}:{}]={:#x}", m.addr, m.size, m.value)?;
        }
        Ok(())
    }
}

/// Receiver of trace records.
pub trait TraceSink: Send {
    /// Consumes one record.
    fn record(&mut self, rec: &TraceRecord);
}

/// Emits every record as a `trace`-level event under the `rvdbg::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTraceSink;

impl TraceSink for TracingTraceSink {
    fn record(&mut self, rec: &TraceRecord) {
        tracing::trace!(target: "rvdbg::trace", "{rec}");
    }
}

/// Keeps every record in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryTraceSink {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl MemoryTraceSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records collected so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl TraceSink for MemoryTraceSink {
    fn record(&mut self, rec: &TraceRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(*rec);
        }
    }
}
