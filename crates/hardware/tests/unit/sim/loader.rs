use pretty_assertions::assert_eq;
use rvdbg_core::common::LoaderError;
use rvdbg_core::config::SystemConfig;
use rvdbg_core::sim::loader::{load_elf, load_image};
use rvdbg_core::soc::{MasterId, MemoryTransaction, MemoryTransactionPort, build_bus};

use crate::common::builder::{NOP, spin};
use crate::common::harness::RAM_BASE;

/// A minimal RV64 executable: one `PT_LOAD` segment holding `code` at `vaddr`.
pub fn elf_image(entry: u64, vaddr: u64, code: &[u8]) -> Vec<u8> {
    const EHDR: u64 = 64;
    const PHDR: u64 = 56;
    let mut out = Vec::new();
    out.extend_from_slice(b"\x7fELF");
    out.extend_from_slice(&[2, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    out.extend_from_slice(&243u16.to_le_bytes()); // EM_RISCV
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&EHDR.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(EHDR as u16).to_le_bytes());
    out.extend_from_slice(&(PHDR as u16).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&64u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    out.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
    out.extend_from_slice(&5u32.to_le_bytes()); // R+X
    out.extend_from_slice(&(EHDR + PHDR).to_le_bytes());
    out.extend_from_slice(&vaddr.to_le_bytes());
    out.extend_from_slice(&vaddr.to_le_bytes());
    out.extend_from_slice(&(code.len() as u64).to_le_bytes());
    out.extend_from_slice(&(code.len() as u64).to_le_bytes());
    out.extend_from_slice(&4u64.to_le_bytes());
    out.extend_from_slice(code);
    out
}

pub fn words(code: &[u32]) -> Vec<u8> {
    code.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn read_word(port: &mut dyn MemoryTransactionPort, addr: u64) -> u64 {
    let mut t = MemoryTransaction::read(addr, 4, MasterId::Debug);
    port.b_transport(&mut t).unwrap();
    t.rdata
}

#[test]
fn elf_segments_land_at_their_addresses() {
    let mut bus = build_bus(&SystemConfig::default());
    let image = elf_image(RAM_BASE + 0x104, RAM_BASE + 0x100, &words(&[NOP, spin()]));

    let entry = load_elf(&mut bus, &image).unwrap();

    assert_eq!(entry, RAM_BASE + 0x104);
    assert_eq!(read_word(&mut bus, RAM_BASE + 0x100), u64::from(NOP));
    assert_eq!(read_word(&mut bus, RAM_BASE + 0x104), u64::from(spin()));
}

#[test]
fn elf_file_is_recognized_by_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.elf");
    std::fs::write(&path, elf_image(RAM_BASE, RAM_BASE, &words(&[spin()]))).unwrap();
    let mut bus = build_bus(&SystemConfig::default());

    // The load address only applies to raw images.
    let entry = load_image(&mut bus, &path, RAM_BASE + 0x4000).unwrap();

    assert_eq!(entry, RAM_BASE);
    assert_eq!(read_word(&mut bus, RAM_BASE), u64::from(spin()));
    assert_eq!(read_word(&mut bus, RAM_BASE + 0x4000), 0);
}

#[test]
fn truncated_elf_is_rejected() {
    let mut bus = build_bus(&SystemConfig::default());
    let image = elf_image(RAM_BASE, RAM_BASE, &words(&[spin()]));
    let err = load_elf(&mut bus, &image[..40]).unwrap_err();
    assert!(matches!(err, LoaderError::Elf(_)));
}

#[test]
fn segment_outside_ram_is_a_placement_error() {
    let mut bus = build_bus(&SystemConfig::default());
    let image = elf_image(0x2000_0000, 0x2000_0000, &words(&[NOP]));
    let err = load_elf(&mut bus, &image).unwrap_err();
    assert!(matches!(err, LoaderError::Placement { addr: 0x2000_0000, .. }));
    assert!(err.to_string().contains("0x20000000"));
}
