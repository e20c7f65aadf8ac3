//! DWARF symbol resolution for the running executable
//!
//! `backtrace::resolve` locates and parses debug info lazily behind a global
//! lock. This backend loads the executable's DWARF sections once, up front,
//! into an `addr2line` context and answers lookups from it.

use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianArcSlice, RunTimeEndian};
use log::debug;
use object::{Object, ObjectKind, ObjectSection};
use rustc_demangle::demangle;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::memory_maps::{parse_memory_maps, MemoryRange};
use super::native::walk_from;
use super::{Address, Anchor, FrameSource, Symbol};

/// [`FrameSource`] that resolves addresses from an executable's DWARF debug info
pub struct DwarfSymbolizer {
    ctx: Mutex<Context<EndianArcSlice<RunTimeEndian>>>,
    /// Load range of a PIE executable; `None` when runtime and file addresses coincide
    range: Option<MemoryRange>,
}

impl DwarfSymbolizer {
    /// Create a symbolizer for the executable of the current process
    ///
    /// # Errors
    /// Returns an error if the executable cannot be located, is not mapped in
    /// `/proc/self/maps`, or carries no usable DWARF debug info
    pub fn for_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        let exe_path = exe.to_str().context("Executable path is not valid UTF-8")?;
        let range = parse_memory_maps(std::process::id(), exe_path)?;
        Self::new(&exe, Some(range))
    }

    /// Create a symbolizer for the given binary, loaded at `range`
    ///
    /// `range` is ignored for non-PIE executables, whose runtime addresses
    /// already are file addresses.
    ///
    /// # Errors
    /// Returns an error if the binary file cannot be read or parsed, or if DWARF debug info
    /// is missing
    pub fn new<P: AsRef<Path>>(binary_path: P, range: Option<MemoryRange>) -> Result<Self> {
        let binary_data = fs::read(binary_path.as_ref()).context("Failed to read binary file")?;

        let obj_file = object::File::parse(&*binary_data).context("Failed to parse object file")?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianArcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianArcSlice::new(Arc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        let range = match obj_file.kind() {
            ObjectKind::Dynamic => range,
            _ => None,
        };
        debug!("Loaded DWARF for {} (pie range: {range:?})", binary_path.as_ref().display());

        Ok(Self { ctx: Mutex::new(ctx), range })
    }

    /// Translate a return address into the file address of its call instruction
    fn file_address(&self, address: Address) -> Option<u64> {
        let call_site = u64::try_from(address.call_site()?).ok()?;
        match self.range {
            Some(range) if range.contains(call_site) => Some(call_site - range.start),
            // Outside the executable (shared library), nothing to look up
            Some(_) => None,
            None => Some(call_site),
        }
    }

    /// Demangle a Rust symbol name, without the trailing hash
    #[must_use]
    pub fn demangle_symbol(symbol: &str) -> String {
        format!("{:#}", demangle(symbol))
    }
}

impl FrameSource for DwarfSymbolizer {
    fn frames_from(&self, anchor: Anchor, skip: usize, count: usize) -> Vec<Address> {
        walk_from(anchor, skip, count)
    }

    fn resolve(&self, address: Address) -> Option<Symbol> {
        let probe = self.file_address(address)?;
        let ctx = self.ctx.lock().unwrap_or_else(PoisonError::into_inner);

        // The first frame is the innermost inlined function at the probe
        let mut frames = ctx.find_frames(probe).skip_all_loads().ok()?;
        let frame = frames.next().ok()??;

        let name = frame.function.as_ref()?.raw_name().ok()?;
        let location = frame.location?;

        Some(Symbol {
            name: Self::demangle_symbol(&name),
            file: PathBuf::from(location.file?),
            line: location.line.filter(|&line| line > 0)?,
        })
    }
}
