//! Memory mapping utilities for the process address space
//!
//! Runtime addresses inside a position-independent executable (PIE) are
//! offset by the load base chosen by ASLR. DWARF line tables use file
//! addresses, so the base has to be found in `/proc/<pid>/maps` and
//! subtracted before a lookup.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Memory range of a loaded binary in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Parse /proc/pid/maps to find the memory range of a specific binary
///
/// # Errors
/// Returns an error if /proc/pid/maps cannot be read or if the binary is not found
pub fn parse_memory_maps(pid: u32, binary_path: &str) -> Result<MemoryRange> {
    read_memory_maps(format!("/proc/{pid}/maps"), binary_path)
}

/// Read a maps file in the `/proc/<pid>/maps` format and find `binary_path` in it
///
/// # Errors
/// Returns an error if the file cannot be read or the binary has no mapping in it
pub fn read_memory_maps<P: AsRef<Path>>(maps_path: P, binary_path: &str) -> Result<MemoryRange> {
    let maps_path = maps_path.as_ref();
    let maps = fs::read_to_string(maps_path)
        .with_context(|| format!("Failed to read {}", maps_path.display()))?;

    let range = memory_range_in(&maps, binary_path)?
        .with_context(|| format!("Could not find memory range for {binary_path}"))?;

    debug!(
        "Executable memory range: 0x{:x} - 0x{:x} (size: {} KB)",
        range.start,
        range.end,
        (range.end - range.start) / 1024
    );
    Ok(range)
}

/// Span every mapping of `binary_path`, from the lowest start to the highest end.
fn memory_range_in(maps: &str, binary_path: &str) -> Result<Option<MemoryRange>> {
    let mut start_addr = None;
    let mut end_addr = None;

    for line in maps.lines() {
        // "start-end perms offset dev inode pathname"
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 || !parts[5..].join(" ").starts_with(binary_path) {
            continue;
        }

        let Some((start, end)) = parts[0].split_once('-') else { continue };
        let start = u64::from_str_radix(start, 16).context("Failed to parse range start")?;
        let end = u64::from_str_radix(end, 16).context("Failed to parse range end")?;

        start_addr = Some(start_addr.map_or(start, |s: u64| s.min(start)));
        end_addr = Some(end_addr.map_or(end, |e: u64| e.max(end)));
    }

    Ok(start_addr.zip(end_addr).map(|(start, end)| MemoryRange { start, end }))
}
