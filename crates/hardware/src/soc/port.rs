//! Memory transaction port.
//!
//! This module defines the only path by which the core touches memory and peripherals. It provides:
//! 1. **Transactions:** `MemoryTransaction`, one read or write of 1, 2, 4 or 8 bytes, tagged with
//!    the bus master that issued it.
//! 2. **Blocking transport:** `b_transport`, completing the access before returning.
//! 3. **Non-blocking transport:** `nb_transport`, delivering completion through a callback.
//!    Ports without a native split-phase path complete inline.

use crate::common::BusError;
use crate::soc::interconnect::Bus;

/// Direction of a memory transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAction {
    /// Read `size` bytes into `rdata`.
    Read,
    /// Write the low `size` bytes of `wdata`.
    Write,
}

/// Bus master that issued a transaction; indexes the bus-utilization counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterId {
    /// The execution core (fetch, load, store).
    #[default]
    Cpu = 0,
    /// The debug support unit (system-bus access, breakpoint injection).
    Debug = 1,
}

/// A single memory transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTransaction {
    /// Physical address of the first byte.
    pub addr: u64,
    /// Read or write.
    pub action: MemAction,
    /// Access width in bytes.
    pub size: usize,
    /// Data to write, little-endian in the low `size` bytes.
    pub wdata: u64,
    /// Data read, little-endian in the low `size` bytes; zero until completed.
    pub rdata: u64,
    /// Issuing master.
    pub source: MasterId,
}

impl MemoryTransaction {
    /// Builds a read of `size` bytes at `addr`.
    pub fn read(addr: u64, size: usize, source: MasterId) -> Self {
        Self {
            addr,
            action: MemAction::Read,
            size,
            wdata: 0,
            rdata: 0,
            source,
        }
    }

    /// Builds a write of the low `size` bytes of `value` at `addr`.
    pub fn write(addr: u64, size: usize, value: u64, source: MasterId) -> Self {
        Self {
            addr,
            action: MemAction::Write,
            size,
            wdata: value,
            rdata: 0,
            source,
        }
    }

    /// Returns `true` for writes.
    pub fn is_write(&self) -> bool {
        self.action == MemAction::Write
    }
}

/// Completion callback of a non-blocking transaction.
pub type TransportCallback = Box<dyn FnOnce(MemoryTransaction, Result<(), BusError>) + Send>;

/// Abstract memory port used by the core for system-bus and debug-bus accesses.
pub trait MemoryTransactionPort: Send {
    /// Performs `trans` to completion; on success reads fill `trans.rdata`.
    ///
    /// # Errors
    ///
    /// Returns a `BusError` when no device accepts the access. `rdata` is left at zero.
    fn b_transport(&mut self, trans: &mut MemoryTransaction) -> Result<(), BusError>;

    /// Starts `trans` and reports completion through `done`.
    ///
    /// The default implementation completes inline through `b_transport`.
    fn nb_transport(&mut self, mut trans: MemoryTransaction, done: TransportCallback) {
        let result = self.b_transport(&mut trans);
        done(trans, result);
    }

    /// Returns the concrete `Bus` behind this port, if it is one.
    fn as_bus_mut(&mut self) -> Option<&mut Bus> {
        None
    }
}
