//! Core Local Interruptor (CLINT).
//!
//! Holds the machine software and timer interrupt registers. `mtime` is driven by the step
//! loop rather than by bus accesses: the listener returned by `Clint::ticker` bumps it once
//! every `divider` steps and re-queues itself. The timer and software interrupt conditions are
//! driven onto `IrqLines` shared with the core.
//!
//! # Memory Map
//!
//! * `0x0000`: MSIP (Machine Software Interrupt Pending)
//! * `0x4000`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::arch::csr::{MIP_MSIP, MIP_MTIP};
use crate::core::events::{EventQueue, ListenerHandle, StepListener};
use crate::soc::irq::IrqLines;
use crate::soc::traits::Device;

/// Offset for the Machine Software Interrupt Pending register.
const MSIP_OFFSET: u64 = 0x0000;
/// Offset for the Machine Time Compare register.
const MTIMECMP_OFFSET: u64 = 0x4000;
/// Offset for the Machine Time register.
const MTIME_OFFSET: u64 = 0xBFF8;
/// Size of the register window in bytes.
const CLINT_SIZE: u64 = 0x10000;

#[derive(Debug)]
struct Timer {
    mtime: u64,
    mtimecmp: u64,
    msip: u32,
}

/// State shared between the bus-side device and its ticker.
#[derive(Debug)]
struct Shared {
    timer: Mutex<Timer>,
    lines: IrqLines,
}

impl Shared {
    fn timer(&self) -> MutexGuard<'_, Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` to the registers, then re-evaluates both interrupt lines.
    fn update<R>(&self, f: impl FnOnce(&mut Timer) -> R) -> R {
        let mut timer = self.timer();
        let out = f(&mut timer);
        self.lines.set(MIP_MTIP, timer.mtime >= timer.mtimecmp);
        self.lines.set(MIP_MSIP, timer.msip & 1 != 0);
        out
    }
}

/// CLINT device structure.
#[derive(Debug)]
pub struct Clint {
    base_addr: u64,
    divider: u64,
    shared: Arc<Shared>,
}

impl Clint {
    /// Creates a new CLINT device.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address.
    /// * `divider` - Steps per `mtime` increment; zero is treated as one.
    pub fn new(base_addr: u64, divider: u64) -> Self {
        Self {
            base_addr,
            divider: divider.max(1),
            shared: Arc::new(Shared {
                timer: Mutex::new(Timer {
                    mtime: 0,
                    mtimecmp: u64::MAX,
                    msip: 0,
                }),
                lines: IrqLines::new(),
            }),
        }
    }

    /// Interrupt lines this device drives; hand a clone to the core.
    pub fn irq_lines(&self) -> IrqLines {
        self.shared.lines.clone()
    }

    /// Steps between two `mtime` increments.
    pub fn divider(&self) -> u64 {
        self.divider
    }

    /// Step callback advancing `mtime`; register it with the core at period `divider()`.
    pub fn ticker(&self) -> ListenerHandle {
        Arc::new(Ticker {
            shared: Arc::clone(&self.shared),
            period: self.divider,
        })
    }

    /// Current machine time.
    pub fn mtime(&self) -> u64 {
        self.shared.timer().mtime
    }
}

/// Re-queuing step callback that advances `mtime` by one.
#[derive(Debug, Clone)]
struct Ticker {
    shared: Arc<Shared>,
    period: u64,
}

impl StepListener for Ticker {
    fn on_step(&self, step: u64, queue: &mut EventQueue) {
        self.shared.update(|t| t.mtime = t.mtime.wrapping_add(1));
        let next = step.saturating_add(self.period);
        if let Err(e) = queue.put(next, Arc::new(self.clone())) {
            tracing::warn!(step, "CLINT timer stopped: {e}");
        }
    }
}

impl Device for Clint {
    fn name(&self) -> &str {
        "CLINT"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, CLINT_SIZE)
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        let val = self.read_u64(offset & !7);
        (val >> ((offset & 7) * 8)) as u8
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        let t = self.shared.timer();
        match offset {
            MSIP_OFFSET => t.msip,
            MTIMECMP_OFFSET => t.mtimecmp as u32,
            o if o == MTIMECMP_OFFSET + 4 => (t.mtimecmp >> 32) as u32,
            MTIME_OFFSET => t.mtime as u32,
            o if o == MTIME_OFFSET + 4 => (t.mtime >> 32) as u32,
            _ => 0,
        }
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        let t = self.shared.timer();
        match offset {
            MSIP_OFFSET => u64::from(t.msip),
            MTIMECMP_OFFSET => t.mtimecmp,
            MTIME_OFFSET => t.mtime,
            _ => 0,
        }
    }

    fn write_u8(&mut self, _offset: u64, _val: u8) {}

    fn write_u32(&mut self, offset: u64, val: u32) {
        let val = u64::from(val);
        self.shared.update(|t| match offset {
            MSIP_OFFSET => t.msip = (val & 1) as u32,
            MTIMECMP_OFFSET => t.mtimecmp = (t.mtimecmp & 0xFFFF_FFFF_0000_0000) | val,
            o if o == MTIMECMP_OFFSET + 4 => {
                t.mtimecmp = (t.mtimecmp & 0x0000_0000_FFFF_FFFF) | (val << 32);
            }
            MTIME_OFFSET => t.mtime = (t.mtime & 0xFFFF_FFFF_0000_0000) | val,
            o if o == MTIME_OFFSET + 4 => t.mtime = (t.mtime & 0x0000_0000_FFFF_FFFF) | (val << 32),
            _ => {}
        });
    }

    fn write_u64(&mut self, offset: u64, val: u64) {
        self.shared.update(|t| match offset {
            MSIP_OFFSET => t.msip = (val & 1) as u32,
            MTIMECMP_OFFSET => t.mtimecmp = val,
            MTIME_OFFSET => t.mtime = val,
            _ => {}
        });
    }

    fn as_clint_mut(&mut self) -> Option<&mut Clint> {
        Some(self)
    }
}
