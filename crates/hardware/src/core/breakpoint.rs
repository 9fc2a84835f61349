//! Breakpoint registry.
//!
//! Address-keyed records of the breakpoints the debugger has planted. Software breakpoints
//! carry the instruction bytes they displaced so the core can restore them on removal and
//! execute them when resuming from the breakpoint; hardware breakpoints leave memory alone
//! and are matched against the program counter before fetch.
//!
//! The registry is plain data. Memory patching happens in the core, through the debug bus.

use std::collections::BTreeMap;
use std::fmt;

/// How a breakpoint is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointKind {
    /// An `ebreak`/`c.ebreak` written over the original instruction.
    Software,
    /// A program-counter comparator; memory is untouched.
    Hardware,
}

impl fmt::Display for BreakpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software => f.write_str("sw"),
            Self::Hardware => f.write_str("hw"),
        }
    }
}

/// One planted breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointRecord {
    /// Instruction address.
    pub addr: u64,
    /// Software or hardware.
    pub kind: BreakpointKind,
    /// Bytes found at `addr` when the breakpoint was planted.
    pub original: [u8; 4],
    /// Bytes written over the original (software breakpoints only).
    pub injected: [u8; 4],
    /// Number of bytes replaced: 4, 2 for compressed code, 0 for hardware breakpoints.
    pub len: usize,
}

impl BreakpointRecord {
    /// Original instruction word, zero-extended to the replaced length.
    pub fn original_word(&self) -> u64 {
        let bytes = if self.kind == BreakpointKind::Hardware {
            &self.original[..]
        } else {
            &self.original[..self.len]
        };
        bytes
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }
}

/// Breakpoints keyed by address.
#[derive(Debug, Clone, Default)]
pub struct BreakpointRegistry {
    records: BTreeMap<u64, BreakpointRecord>,
}

impl BreakpointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `bp`, replacing any record at the same address.
    pub fn insert(&mut self, bp: BreakpointRecord) -> Option<BreakpointRecord> {
        self.records.insert(bp.addr, bp)
    }

    /// Removes and returns the record at `addr`.
    pub fn remove(&mut self, addr: u64) -> Option<BreakpointRecord> {
        self.records.remove(&addr)
    }

    /// Returns the record at `addr`.
    pub fn get(&self, addr: u64) -> Option<&BreakpointRecord> {
        self.records.get(&addr)
    }

    /// Returns `true` when any breakpoint sits at `addr`.
    pub fn contains(&self, addr: u64) -> bool {
        self.records.contains_key(&addr)
    }

    /// Returns `true` when a hardware breakpoint sits at `addr`.
    pub fn is_hardware(&self, addr: u64) -> bool {
        self.records
            .get(&addr)
            .is_some_and(|bp| bp.kind == BreakpointKind::Hardware)
    }

    /// Records in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &BreakpointRecord> {
        self.records.values()
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no breakpoint is planted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forgets every record without touching memory.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
