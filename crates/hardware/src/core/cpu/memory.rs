//! Memory Access Helpers.
//!
//! This module provides the interface between the core and its transaction ports.
//! It performs the following:
//! 1. **Routing:** CPU-master accesses go to the system bus, debug-master accesses to the
//!    debug bus; every transaction is counted in the bus-utilization counters.
//! 2. **Instruction Fetch:** Fills the instruction line buffer from `pc`.
//! 3. **Data Access:** Loads and stores with alignment checks, folding bus failures into
//!    access-fault traps.

use super::Cpu;
use crate::common::constants::FETCH_LINE_BYTES;
use crate::common::{BusError, Trap};
use crate::debug::trace::MemOp;
use crate::soc::port::{MasterId, MemoryTransaction};

impl Cpu {
    /// Performs `trans` on the port of its master and updates the utilization counters.
    ///
    /// # Errors
    ///
    /// The `BusError` reported by the port.
    pub fn transport(&mut self, trans: &mut MemoryTransaction) -> Result<(), BusError> {
        let util = &mut self.bus_util[trans.source as usize];
        if trans.is_write() {
            util.writes += 1;
        } else {
            util.reads += 1;
        }
        let result = match trans.source {
            MasterId::Cpu => self.sysbus.b_transport(trans),
            MasterId::Debug => self.debug_bus().b_transport(trans),
        };
        if let Err(e) = &result {
            tracing::warn!(
                master = ?trans.source,
                addr = format_args!("{:#x}", trans.addr),
                size = trans.size,
                "bus error: {e}"
            );
        }
        result
    }

    /// Reads `size` bytes at `addr` through the debug bus.
    ///
    /// # Errors
    ///
    /// The `BusError` reported by the port.
    pub fn debug_read(&mut self, addr: u64, size: usize) -> Result<u64, BusError> {
        let mut trans = MemoryTransaction::read(addr, size, MasterId::Debug);
        self.transport(&mut trans)?;
        Ok(trans.rdata)
    }

    /// Writes the low `size` bytes of `val` at `addr` through the debug bus.
    ///
    /// # Errors
    ///
    /// The `BusError` reported by the port.
    pub fn debug_write(&mut self, addr: u64, size: usize, val: u64) -> Result<(), BusError> {
        let mut trans = MemoryTransaction::write(addr, size, val, MasterId::Debug);
        self.transport(&mut trans)
    }

    /// Fetches the instruction line at `pc` into the line buffer.
    ///
    /// A full-line read that fails is retried as a half-word so compressed code at the very
    /// end of a device still fetches.
    pub(crate) fn fetch_line(&mut self, pc: u64) -> Option<u32> {
        let mut trans = MemoryTransaction::read(pc, FETCH_LINE_BYTES, MasterId::Cpu);
        let raw = match self.transport(&mut trans) {
            Ok(()) => trans.rdata as u32,
            Err(_) => {
                let mut half = MemoryTransaction::read(pc, 2, MasterId::Cpu);
                self.transport(&mut half).ok()?;
                half.rdata as u32
            }
        };
        self.cache_line = raw.to_le_bytes();
        Some(raw)
    }

    /// Loads `size` bytes from `addr` for the executing instruction.
    ///
    /// Returns `None` after raising a misaligned or access-fault exception.
    pub fn load(&mut self, addr: u64, size: usize) -> Option<u64> {
        if addr % size as u64 != 0 {
            self.raise_exception(Trap::LoadAddressMisaligned(addr));
            return None;
        }
        let mut trans = MemoryTransaction::read(addr, size, MasterId::Cpu);
        if self.transport(&mut trans).is_err() {
            self.raise_exception(Trap::LoadAccessFault(addr));
            return None;
        }
        if self.trace_sink.is_some() {
            self.trace_record.mem = Some(MemOp {
                addr,
                size,
                write: false,
                value: trans.rdata,
            });
        }
        Some(trans.rdata)
    }

    /// Stores the low `size` bytes of `val` at `addr` for the executing instruction.
    ///
    /// Misaligned and failing stores raise an exception instead.
    pub fn store(&mut self, addr: u64, size: usize, val: u64) {
        if addr % size as u64 != 0 {
            self.raise_exception(Trap::StoreAddressMisaligned(addr));
            return;
        }
        let mut trans = MemoryTransaction::write(addr, size, val, MasterId::Cpu);
        if self.transport(&mut trans).is_err() {
            self.raise_exception(Trap::StoreAccessFault(addr));
            return;
        }
        if self.trace_sink.is_some() {
            self.trace_record.mem = Some(MemOp {
                addr,
                size,
                write: true,
                value: val,
            });
        }
    }
}
