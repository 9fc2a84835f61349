//! Simulator: the composition root.
//!
//! Wires the core to its system bus from configuration, connects the CLINT timer to the core's
//! interrupt lines and step callbacks, loads the program image, and exposes the step loop and
//! the command console to front ends.

use std::path::Path;

use crate::common::{ConsoleError, LoaderError};
use crate::config::Config;
use crate::core::{Cpu, Hap};
use crate::debug::console::Console;
use crate::sim::loader;
use crate::soc::builder::build_bus;

/// Top-level simulator: the core plus its console.
#[derive(Debug)]
pub struct Simulator {
    /// Execution core; owns the system bus.
    pub cpu: Cpu,
    console: Console,
    config: Config,
    configured: bool,
}

impl Simulator {
    /// Builds the system described by `config`. The core starts powered off.
    ///
    /// Hap observers registered on `cpu` before `config_done` (or `power_on`) see
    /// `Hap::ConfigDone`.
    pub fn new(config: &Config) -> Self {
        let mut bus = build_bus(&config.system);
        let timer = bus
            .find_clint()
            .map(|clint| (clint.irq_lines(), clint.ticker(), clint.divider()));
        let mut cpu = Cpu::new(Box::new(bus), None, &config.general);
        if let Some((lines, ticker, period)) = timer {
            cpu.attach_irq_lines(lines);
            cpu.add_step_device(ticker, period);
        }
        Self {
            cpu,
            console: Console::new(config.system.dsu_base),
            config: config.clone(),
            configured: false,
        }
    }

    /// Announces the end of configuration with `Hap::ConfigDone`; later calls do nothing.
    pub fn config_done(&mut self) {
        if !self.configured {
            self.configured = true;
            tracing::debug!("configuration done");
            self.cpu.notify(&Hap::ConfigDone);
        }
    }

    /// Configuration the simulator was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads an ELF or raw image and points the reset vector at its entry.
    ///
    /// Raw images are placed at `load_addr`, or at the start of RAM when `None`.
    ///
    /// # Errors
    ///
    /// The `LoaderError` of the load.
    pub fn load(&mut self, path: &Path, load_addr: Option<u64>) -> Result<u64, LoaderError> {
        let addr = load_addr.unwrap_or(self.config.system.ram_base);
        let entry = loader::load_image(self.cpu.debug_bus(), path, addr)?;
        self.cpu.set_reset_vector(entry);
        Ok(entry)
    }

    /// Finishes configuration if not done yet, then deasserts reset; the core starts running
    /// at the reset vector.
    pub fn power_on(&mut self) {
        self.config_done();
        self.cpu.reset(false);
    }

    /// Runs up to `max` iterations of the step loop, stopping early once the core is neither
    /// running nor waiting on a debug transaction.
    ///
    /// # Returns
    ///
    /// Number of instruction slots consumed.
    pub fn run_steps(&mut self, max: u64) -> u64 {
        let mut consumed = 0;
        for _ in 0..max {
            if !self.cpu.is_running() && !self.cpu.debug_port_pending() {
                break;
            }
            if self.cpu.update_pipeline() {
                consumed += 1;
            }
        }
        consumed
    }

    /// Executes one console command.
    ///
    /// # Errors
    ///
    /// The `ConsoleError` of the command.
    pub fn execute(&mut self, line: &str) -> Result<String, ConsoleError> {
        self.console.execute(&mut self.cpu, line)
    }

    /// Drains the bytes transmitted by the UART since the last call.
    pub fn take_uart_output(&mut self) -> Vec<u8> {
        self.cpu
            .system_bus()
            .as_bus_mut()
            .and_then(|bus| bus.find_uart())
            .map(|uart| uart.take_output())
            .unwrap_or_default()
    }
}
