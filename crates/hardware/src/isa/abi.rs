//! RISC-V Application Binary Interface (ABI) register names.
//!
//! Maps between register indices and the names used by the calling convention, for the
//! disassembler and the console's register lookup.

/// Register x0 (zero register, always zero).
pub const REG_ZERO: usize = 0;
/// Register x1 (return address, ra).
pub const REG_RA: usize = 1;
/// Register x2 (stack pointer, sp).
pub const REG_SP: usize = 2;
/// Register x5 (alternate link register, t0).
pub const REG_T0: usize = 5;
/// Register x10 (first argument/return value, a0).
pub const REG_A0: usize = 10;

/// ABI names of the integer registers, indexed by register number.
pub const GPR_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// ABI names of the floating-point registers, indexed by register number.
pub const FPR_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2",
    "fa3", "fa4", "fa5", "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9",
    "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

/// Resolves `x<n>`, an ABI name, or `fp` (alias of `s0`) to an integer register index.
pub fn gpr_by_name(name: &str) -> Option<usize> {
    if name == "fp" {
        return Some(8);
    }
    if let Some(idx) = name.strip_prefix('x').and_then(|n| n.parse::<usize>().ok()) {
        return (idx < 32).then_some(idx);
    }
    GPR_NAMES.iter().position(|n| *n == name)
}

/// Resolves `f<n>` or an ABI name to a floating-point register index.
pub fn fpr_by_name(name: &str) -> Option<usize> {
    if let Some(idx) = name
        .strip_prefix('f')
        .filter(|n| n.chars().all(|c| c.is_ascii_digit()))
        .and_then(|n| n.parse::<usize>().ok())
    {
        return (idx < 32).then_some(idx);
    }
    FPR_NAMES.iter().position(|n| *n == name)
}
