//! Program Image Loader.
//!
//! This module places a program image in target memory before power-on. It performs:
//! 1. **Format Detection:** ELF files are recognized by their magic; anything else is a raw
//!    binary.
//! 2. **ELF Loading:** Every loadable segment is written at its address and the entry point
//!    becomes the reset vector.
//! 3. **Raw Loading:** The file is written at the requested address, which is also the entry.
//!
//! All writes go through a `MemoryTransactionPort`, normally the core's debug bus.

use std::fs;
use std::path::Path;

use object::{Object, ObjectSegment};

use crate::common::{BusError, LoaderError};
use crate::soc::port::{MasterId, MemoryTransaction, MemoryTransactionPort};

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Reads `path` and loads it through `port`.
///
/// # Arguments
///
/// * `port` - Port the image is written through.
/// * `path` - ELF or raw binary file.
/// * `load_addr` - Placement of a raw binary; ignored for ELF.
///
/// # Returns
///
/// The entry point: the ELF entry, or `load_addr` for a raw binary.
///
/// # Errors
///
/// `LoaderError` when the file cannot be read or parsed, or a write is refused.
pub fn load_image(
    port: &mut dyn MemoryTransactionPort,
    path: &Path,
    load_addr: u64,
) -> Result<u64, LoaderError> {
    let data = fs::read(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if data.starts_with(ELF_MAGIC) {
        load_elf(port, &data)
    } else {
        write_bytes(port, load_addr, &data)
            .map_err(|source| LoaderError::Placement { addr: load_addr, source })?;
        tracing::info!(
            path = %path.display(),
            addr = format_args!("{load_addr:#x}"),
            len = data.len(),
            "raw image loaded"
        );
        Ok(load_addr)
    }
}

/// Loads the segments of an in-memory ELF image and returns its entry point.
///
/// # Errors
///
/// `LoaderError::Elf` for malformed images, `LoaderError::Placement` for refused writes.
pub fn load_elf(port: &mut dyn MemoryTransactionPort, data: &[u8]) -> Result<u64, LoaderError> {
    let file = object::File::parse(data)?;
    for segment in file.segments() {
        let bytes = segment.data()?;
        if bytes.is_empty() {
            continue;
        }
        let addr = segment.address();
        write_bytes(port, addr, bytes).map_err(|source| LoaderError::Placement { addr, source })?;
        tracing::debug!(
            addr = format_args!("{addr:#x}"),
            len = bytes.len(),
            "ELF segment loaded"
        );
    }
    let entry = file.entry();
    tracing::info!(entry = format_args!("{entry:#x}"), "ELF image loaded");
    Ok(entry)
}

/// Writes `data` at `addr`, eight bytes per transaction where alignment allows.
///
/// # Errors
///
/// The first `BusError` reported by the port.
pub fn write_bytes(
    port: &mut dyn MemoryTransactionPort,
    addr: u64,
    data: &[u8],
) -> Result<(), BusError> {
    let mut offset = 0;
    while offset < data.len() {
        let at = addr + offset as u64;
        let rest = &data[offset..];
        let size = if at % 8 == 0 && rest.len() >= 8 { 8 } else { 1 };
        let value = rest[..size]
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let mut trans = MemoryTransaction::write(at, size, value, MasterId::Debug);
        port.b_transport(&mut trans)?;
        offset += size;
    }
    Ok(())
}
