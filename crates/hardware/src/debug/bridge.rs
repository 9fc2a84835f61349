//! Debug-port bridge.
//!
//! A single-slot mailbox between an external debug agent and the execution core. The agent
//! submits one `{region, addr}` access together with a response callback; the core takes the
//! slot at the top of its next step, performs the access and invokes the callback. A second
//! submission while the slot is occupied is refused and handed back to the caller.

use std::fmt;

use crate::common::DebugPortError;

/// One access to the debug support unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugPortTransaction {
    /// Register region (0 CSRs, 1 register file, 2 control, 3 debug module).
    pub region: u32,
    /// Register index within the region.
    pub addr: u64,
    /// `true` for a write of `wdata`, `false` for a read into `rdata`.
    pub write: bool,
    /// Value to write.
    pub wdata: u64,
    /// Value read; zero for writes and failed accesses.
    pub rdata: u64,
}

impl DebugPortTransaction {
    /// Builds a read of `region`/`addr`.
    pub fn read(region: u32, addr: u64) -> Self {
        Self {
            region,
            addr,
            ..Self::default()
        }
    }

    /// Builds a write of `value` to `region`/`addr`.
    pub fn write(region: u32, addr: u64, value: u64) -> Self {
        Self {
            region,
            addr,
            write: true,
            wdata: value,
            rdata: 0,
        }
    }
}

/// Invoked exactly once with the completed transaction.
pub type ResponseCallback = Box<dyn FnOnce(&DebugPortTransaction) + Send>;

/// The single in-flight slot.
#[derive(Default)]
pub struct DebugPortBridge {
    pending: Option<(DebugPortTransaction, ResponseCallback)>,
}

impl fmt::Debug for DebugPortBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugPortBridge")
            .field("pending", &self.pending.as_ref().map(|(t, _)| t))
            .finish()
    }
}

impl DebugPortBridge {
    /// Creates an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupies the slot with `trans`.
    ///
    /// # Errors
    ///
    /// `DebugPortError::Busy` carrying `trans` and `cb` back when the slot is occupied.
    pub fn submit(
        &mut self,
        trans: DebugPortTransaction,
        cb: ResponseCallback,
    ) -> Result<(), DebugPortError> {
        if let Some((inflight, _)) = &self.pending {
            tracing::warn!(
                region = trans.region,
                addr = format_args!("{:#x}", trans.addr),
                inflight_region = inflight.region,
                inflight_addr = format_args!("{:#x}", inflight.addr),
                "debug port busy, transaction rejected"
            );
            return Err(DebugPortError::Busy(Box::new(trans), cb));
        }
        self.pending = Some((trans, cb));
        Ok(())
    }

    /// Empties the slot, returning what was pending.
    pub fn take(&mut self) -> Option<(DebugPortTransaction, ResponseCallback)> {
        self.pending.take()
    }

    /// Returns `true` while a transaction waits for service.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
