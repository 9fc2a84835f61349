//! Call-stack trace.
//!
//! Calls push a `(call site, target)` pair and returns pop it. The buffer has a fixed number of
//! entries; pushes past the end are dropped but still counted, so a count above the capacity
//! tells the debugger the trace overflowed.

use super::Cpu;

impl Cpu {
    /// Records a call from `pc` to `target`.
    pub fn push_stack_trace(&mut self, pc: u64, target: u64) {
        if let Some(slot) = usize::try_from(self.stack_trace_cnt)
            .ok()
            .and_then(|idx| self.stack_trace_buf.get_mut(idx))
        {
            *slot = (pc, target);
        }
        self.stack_trace_cnt = self.stack_trace_cnt.saturating_add(1);
    }

    /// Forgets the innermost call.
    pub fn pop_stack_trace(&mut self) {
        self.stack_trace_cnt = self.stack_trace_cnt.saturating_sub(1);
    }

    /// Number of calls currently recorded, including dropped ones.
    pub fn stack_trace_count(&self) -> u64 {
        self.stack_trace_cnt
    }

    /// Capacity of the buffer in entries.
    pub fn stack_trace_capacity(&self) -> usize {
        self.stack_trace_buf.len()
    }

    /// Recorded entries, innermost last.
    pub fn stack_trace(&self) -> &[(u64, u64)] {
        let len = usize::try_from(self.stack_trace_cnt)
            .unwrap_or(usize::MAX)
            .min(self.stack_trace_buf.len());
        &self.stack_trace_buf[..len]
    }

    /// Word `idx` of the buffer as seen through the debug port: two words per entry.
    pub(crate) fn stack_trace_word(&self, idx: u64) -> u64 {
        usize::try_from(idx / 2)
            .ok()
            .and_then(|entry| self.stack_trace_buf.get(entry))
            .map_or(0, |&(pc, target)| if idx % 2 == 0 { pc } else { target })
    }
}
