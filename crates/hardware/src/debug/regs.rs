//! Bit-field views of the debug registers.
//!
//! Each register is a plain integer newtype with named field accessors generated by
//! `bitfield!`; conversion to and from the raw integer happens at the transaction boundary.

use bitfield::bitfield;

bitfield! {
    /// Run-control register, region 2 index 0.
    ///
    /// Writes: `halt` requests a halt, else `stepping` requests a step, else the core resumes.
    /// Reads: `halt` is the halted state and `breakpoint` is the breakpoint-hit flag. Both
    /// `stepping` and `breakpoint` name bit 1.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct DsuControl(u64);
    impl Debug;

    pub halt, set_halt: 0;
    pub stepping, set_stepping: 1;
    pub breakpoint, set_breakpoint: 1;
    pub core_id, set_core_id: 31, 16;
}

bitfield! {
    /// Breakpoint control register, region 2 index 4.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct BreakpointControl(u64);
    impl Debug;

    /// Deliver `ebreak` as a breakpoint exception instead of halting.
    pub trap_on_break, set_trap_on_break: 0;
}

bitfield! {
    /// `dmcontrol`, DMI 0x10.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dmcontrol(u32);
    impl Debug;

    pub haltreq, set_haltreq: 31;
    pub resumereq, set_resumereq: 30;
    pub hartreset, set_hartreset: 29;
    pub ackhavereset, set_ackhavereset: 28;
    pub hasel, set_hasel: 26;
    pub hartsello, set_hartsello: 25, 16;
    pub hartselhi, set_hartselhi: 15, 6;
    pub ndmreset, set_ndmreset: 1;
    pub dmactive, set_dmactive: 0;
}

bitfield! {
    /// `dmstatus`, DMI 0x11. Read-only.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dmstatus(u32);
    impl Debug;

    pub impebreak, set_impebreak: 22;
    pub allhavereset, set_allhavereset: 19;
    pub anyhavereset, set_anyhavereset: 18;
    pub allresumeack, set_allresumeack: 17;
    pub anyresumeack, set_anyresumeack: 16;
    pub allnonexistent, set_allnonexistent: 15;
    pub anynonexistent, set_anynonexistent: 14;
    pub allunavail, set_allunavail: 13;
    pub anyunavail, set_anyunavail: 12;
    pub allrunning, set_allrunning: 11;
    pub anyrunning, set_anyrunning: 10;
    pub allhalted, set_allhalted: 9;
    pub anyhalted, set_anyhalted: 8;
    pub authenticated, set_authenticated: 7;
    pub version, set_version: 3, 0;
}

bitfield! {
    /// `hartinfo`, DMI 0x12. Read-only.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Hartinfo(u32);
    impl Debug;

    pub nscratch, set_nscratch: 23, 20;
    pub dataaccess, set_dataaccess: 16;
    pub datasize, set_datasize: 15, 12;
    pub dataaddr, set_dataaddr: 11, 0;
}

bitfield! {
    /// `abstractcs`, DMI 0x16. `cmderr` is write-one-to-clear.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Abstractcs(u32);
    impl Debug;

    pub progbufsize, set_progbufsize: 28, 24;
    pub busy, set_busy: 12;
    pub cmderr, set_cmderr: 10, 8;
    pub datacount, set_datacount: 3, 0;
}

bitfield! {
    /// Access-register form of `command`, DMI 0x17.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct AccessRegisterCommand(u32);
    impl Debug;

    pub cmdtype, set_cmdtype: 31, 24;
    pub aarsize, set_aarsize: 22, 20;
    pub aarpostincrement, set_aarpostincrement: 19;
    pub postexec, set_postexec: 18;
    pub transfer, set_transfer: 17;
    pub write, set_write: 16;
    pub regno, set_regno: 15, 0;
}

bitfield! {
    /// `sbcs`, DMI 0x38. `sberror` and `sbbusyerror` are write-one-to-clear.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sbcs(u32);
    impl Debug;

    pub sbversion, set_sbversion: 31, 29;
    pub sbbusyerror, set_sbbusyerror: 22;
    pub sbbusy, set_sbbusy: 21;
    pub sbreadonaddr, set_sbreadonaddr: 20;
    pub sbaccess, set_sbaccess: 19, 17;
    pub sbautoincrement, set_sbautoincrement: 16;
    pub sbreadondata, set_sbreadondata: 15;
    pub sberror, set_sberror: 14, 12;
    pub sbasize, set_sbasize: 11, 5;
    pub sbaccess64, set_sbaccess64: 3;
    pub sbaccess32, set_sbaccess32: 2;
    pub sbaccess16, set_sbaccess16: 1;
    pub sbaccess8, set_sbaccess8: 0;
}

/// `abstractcs.cmderr` values.
pub mod cmderr {
    /// No error.
    pub const NONE: u32 = 0;
    /// The command is not supported.
    pub const NOT_SUPPORTED: u32 = 2;
    /// An exception occurred while executing the command (bad register number).
    pub const EXCEPTION: u32 = 3;
    /// The hart was not in the state the command requires.
    pub const HALT_RESUME: u32 = 4;
}

/// `sbcs.sberror` values.
pub mod sberror {
    /// No error.
    pub const NONE: u32 = 0;
    /// No device at the address.
    pub const BAD_ADDRESS: u32 = 2;
    /// Misaligned access.
    pub const ALIGNMENT: u32 = 3;
    /// Unsupported access size.
    pub const SIZE: u32 = 4;
}
