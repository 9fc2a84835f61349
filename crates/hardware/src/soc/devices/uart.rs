//! Universal Asynchronous Receiver-Transmitter (UART).
//!
//! Implements the transmit side of a 16550-compatible UART. Standard input belongs to the
//! debugger console, so the receiver never has data; the line status register always reports
//! an empty receiver and a ready transmitter. Transmitted bytes are collected and each
//! completed line is emitted through `tracing` under the `uart` target.

use crate::soc::traits::Device;

/// Transmitter Holding Register (write) / Receiver Buffer Register (read).
const REG_THR: u64 = 0;
/// Interrupt Enable Register.
const REG_IER: u64 = 1;
/// Interrupt Identity Register (read).
const REG_IIR: u64 = 2;
/// Line Control Register.
const REG_LCR: u64 = 3;
/// Line Status Register.
const REG_LSR: u64 = 5;
/// Scratch Register.
const REG_SCR: u64 = 7;

/// Interrupt Identity Register: no interrupt pending.
const IIR_NO_INTERRUPT: u8 = 0x01;
/// Line Status Register: transmitter holding register empty.
const LSR_THRE: u8 = 0x20;
/// Line Status Register: transmitter empty.
const LSR_TEMT: u8 = 0x40;

/// Size of the register window in bytes.
const UART_SIZE: u64 = 0x100;

/// UART device structure.
#[derive(Debug, Clone)]
pub struct Uart {
    base_addr: u64,
    ier: u8,
    lcr: u8,
    scr: u8,
    line: Vec<u8>,
    output: Vec<u8>,
}

impl Uart {
    /// Creates a new UART at `base_addr`.
    pub fn new(base_addr: u64) -> Self {
        Self {
            base_addr,
            ier: 0,
            lcr: 0,
            scr: 0,
            line: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Drains everything transmitted since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    fn transmit(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == b'\n' {
            let text = String::from_utf8_lossy(&self.line).into_owned();
            tracing::info!(target: "uart", "{text}");
            self.line.clear();
        } else {
            self.line.push(byte);
        }
    }
}

impl Device for Uart {
    fn name(&self) -> &str {
        "UART0"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, UART_SIZE)
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        match offset {
            REG_IER => self.ier,
            REG_IIR => IIR_NO_INTERRUPT,
            REG_LCR => self.lcr,
            REG_LSR => LSR_THRE | LSR_TEMT,
            REG_SCR => self.scr,
            _ => 0,
        }
    }

    fn write_u8(&mut self, offset: u64, val: u8) {
        match offset {
            REG_THR => self.transmit(val),
            REG_IER => self.ier = val & 0x0F,
            REG_LCR => self.lcr = val,
            REG_SCR => self.scr = val,
            _ => {}
        }
    }

    fn as_uart_mut(&mut self) -> Option<&mut Uart> {
        Some(self)
    }
}
