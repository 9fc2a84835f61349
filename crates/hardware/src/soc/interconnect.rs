//! System interconnect (bus) for memory and MMIO access.
//!
//! This module implements the bus that routes physical address accesses to devices. It provides:
//! 1. **Device registration:** Devices are added by address range and sorted for lookup.
//! 2. **Access routing:** Transactions are routed by address with a last-device hint.
//! 3. **Transport:** The bus is a `MemoryTransactionPort`, so the core can use it as system bus
//!    and, absent a dedicated one, as debug bus.
//! 4. **Loading:** Binary blobs are placed through the owning device.

use super::devices::{Clint, Device, Uart};
use super::port::{MemAction, MemoryTransaction, MemoryTransactionPort};
use crate::common::BusError;

/// System bus connecting the core and devices; routes accesses by physical address.
pub struct Bus {
    /// Registered MMIO and memory devices, sorted by base address.
    devices: Vec<Box<dyn Device + Send>>,
    last_device_idx: usize,
    uart_idx: Option<usize>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.devices.iter().map(|d| d.name()).collect();
        f.debug_struct("Bus").field("devices", &names).finish()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates an empty bus; add devices with `add_device`.
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            last_device_idx: 0,
            uart_idx: None,
        }
    }

    /// Registers a device on the bus; devices are sorted by base address for lookup.
    pub fn add_device(&mut self, dev: Box<dyn Device + Send>) {
        tracing::debug!(
            name = dev.name(),
            base = format_args!("{:#x}", dev.address_range().0),
            "bus: device attached"
        );
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.uart_idx = self.devices.iter().position(|d| d.name() == "UART0");
        self.last_device_idx = 0;
    }

    /// Writes a binary blob into memory at the given physical address.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Unmapped` when no single device holds the whole blob.
    pub fn load_binary_at(&mut self, data: &[u8], addr: u64) -> Result<(), BusError> {
        let len = data.len() as u64;
        match self.find_device(addr, len.max(1)) {
            Some((dev, offset)) => {
                dev.write_bytes(offset, data);
                Ok(())
            }
            None => Err(BusError::Unmapped(addr)),
        }
    }

    /// Returns whether the given physical address is backed by any device.
    pub fn is_valid_address(&self, paddr: u64) -> bool {
        self.devices.iter().any(|d| {
            let (start, size) = d.address_range();
            paddr >= start && paddr - start < size
        })
    }

    /// Returns the UART, if one is attached.
    pub fn find_uart(&mut self) -> Option<&mut Uart> {
        let idx = self.uart_idx?;
        self.devices.get_mut(idx)?.as_uart_mut()
    }

    /// Returns the CLINT, if one is attached.
    pub fn find_clint(&mut self) -> Option<&mut Clint> {
        self.devices.iter_mut().find_map(|d| d.as_clint_mut())
    }

    fn find_device(&mut self, paddr: u64, len: u64) -> Option<(&mut Box<dyn Device + Send>, u64)> {
        let fits = |dev: &dyn Device| {
            let (start, size) = dev.address_range();
            paddr >= start && paddr - start < size && paddr - start + len <= size
        };

        if self
            .devices
            .get(self.last_device_idx)
            .is_some_and(|d| fits(d.as_ref()))
        {
            let dev = &mut self.devices[self.last_device_idx];
            let offset = paddr - dev.address_range().0;
            return Some((dev, offset));
        }

        let idx = self.devices.iter().position(|d| fits(d.as_ref()))?;
        self.last_device_idx = idx;
        let dev = &mut self.devices[idx];
        let offset = paddr - dev.address_range().0;
        Some((dev, offset))
    }
}

impl MemoryTransactionPort for Bus {
    fn b_transport(&mut self, trans: &mut MemoryTransaction) -> Result<(), BusError> {
        if !matches!(trans.size, 1 | 2 | 4 | 8) {
            return Err(BusError::Unsupported(trans.size));
        }
        let len = trans.size as u64;
        let Some((dev, offset)) = self.find_device(trans.addr, len) else {
            if self.is_valid_address(trans.addr) {
                return Err(BusError::Misaligned {
                    addr: trans.addr,
                    size: trans.size,
                });
            }
            return Err(BusError::Unmapped(trans.addr));
        };

        match trans.action {
            MemAction::Read => {
                trans.rdata = match trans.size {
                    1 => u64::from(dev.read_u8(offset)),
                    2 => u64::from(dev.read_u16(offset)),
                    4 => u64::from(dev.read_u32(offset)),
                    _ => dev.read_u64(offset),
                };
            }
            MemAction::Write => match trans.size {
                1 => dev.write_u8(offset, trans.wdata as u8),
                2 => dev.write_u16(offset, trans.wdata as u16),
                4 => dev.write_u32(offset, trans.wdata as u32),
                _ => dev.write_u64(offset, trans.wdata),
            },
        }
        Ok(())
    }

    fn as_bus_mut(&mut self) -> Option<&mut Bus> {
        Some(self)
    }
}
