//! Interrupt request lines between devices and the core.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Level-sensitive interrupt lines, one bit per `mip` bit.
///
/// Clones share the same lines: the device drives them and the core samples them into `mip`.
#[derive(Debug, Clone, Default)]
pub struct IrqLines(Arc<AtomicU64>);

impl IrqLines {
    /// Creates a set of lines, all low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives the lines in `mask` high (`level == true`) or low.
    pub fn set(&self, mask: u64, level: bool) {
        let _ = if level {
            self.0.fetch_or(mask, Ordering::Relaxed)
        } else {
            self.0.fetch_and(!mask, Ordering::Relaxed)
        };
    }

    /// Lines currently high.
    pub fn pending(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
