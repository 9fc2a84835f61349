//! Simulation statistics collection and reporting.
//!
//! This module tracks run-control and debug activity of the core. It provides:
//! 1. **Progress:** Steps (consumed instruction slots) and executed instructions.
//! 2. **Debug activity:** Halts, breakpoint hits, and serviced debug-port transactions.
//! 3. **Traps:** Exceptions and interrupts delivered to the program.
//! 4. **Reporting:** A printable summary and a `serde` view for machine-readable output.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

/// Simulation statistics structure.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    /// Instruction slots consumed (equals the step counter advance).
    pub steps: u64,
    /// Instructions fetched and executed (excludes hardware-breakpoint slots).
    pub executed: u64,
    /// Transitions into the halted state.
    pub halts: u64,
    /// Halts caused by a hardware or software breakpoint.
    pub breakpoint_hits: u64,
    /// Debug-port transactions serviced.
    pub debug_transactions: u64,
    /// Traps taken (exceptions and interrupts), including ones that halted the core.
    pub traps: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            steps: 0,
            executed: 0,
            halts: 0,
            breakpoint_hits: 0,
            debug_transactions: 0,
            traps: 0,
        }
    }
}

impl SimStats {
    /// Host wall-clock seconds since the statistics were created.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Executed instructions per host second, in millions.
    pub fn mips(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.executed as f64 / secs / 1_000_000.0
        } else {
            0.0
        }
    }

    /// Prints the summary to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==========================================================")?;
        writeln!(f, "  steps               {:>16}", self.steps)?;
        writeln!(f, "  executed            {:>16}", self.executed)?;
        writeln!(f, "  halts               {:>16}", self.halts)?;
        writeln!(f, "  breakpoint hits     {:>16}", self.breakpoint_hits)?;
        writeln!(f, "  debug transactions  {:>16}", self.debug_transactions)?;
        writeln!(f, "  traps               {:>16}", self.traps)?;
        writeln!(f, "  host time           {:>14.3} s", self.elapsed_secs())?;
        writeln!(f, "  speed               {:>12.3} MIPS", self.mips())?;
        write!(f, "==========================================================")
    }
}
