
/// Step-ordered callback queue and the core's use of it.
pub mod events;


/// Run-control verbs, reset and haps.
pub mod run_control;

/// Stack-trace bookkeeping through calls and returns.
pub mod stack_trace;

/// Stepping budgets.
pub mod stepping;
