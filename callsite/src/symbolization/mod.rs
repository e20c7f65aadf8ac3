//! # Stack Walking and Symbol Resolution
//!
//! This module is the boundary between callsite and the platform. Everything
//! above it works in terms of two questions:
//!
//! 1. "Give me `count` return addresses, starting `skip` frames above the
//!    caller of this entry point" ([`FrameSource::frames_from`])
//! 2. "Which function, file and line does this address belong to?"
//!    ([`FrameSource::resolve`])
//!
//! ## Anchoring
//!
//! A stack walk starts deep inside the unwinder, and the number of frames
//! between the unwinder and the public entry point depends on the platform,
//! the `backtrace` version and the optimizer. Rather than counting those
//! frames, each entry point passes its own function address as an
//! [`Anchor`]. The walk discards every frame up to and including the one
//! whose enclosing function starts at the anchor; the next frame is offset 0.
//!
//! ```text
//! backtrace internals      <- discarded
//! NativeFrames::frames_from
//! Resolver::locate
//! callsite::here           <- anchor frame, discarded
//! user_fn                  <- offset 0
//! user_fn's caller         <- offset 1
//! ```
//!
//! ## Backends
//!
//! - **`native`**: [`NativeFrames`], walks with `backtrace::trace` and
//!   resolves with `backtrace::resolve`. Works for any binary `backtrace`
//!   understands.
//! - **`dwarf`**: [`DwarfSymbolizer`], walks with `backtrace::trace` but
//!   resolves through an `addr2line` context loaded once from the running
//!   executable's DWARF sections.
//!
//! ## Return Addresses
//!
//! Walked frames carry *return* addresses, which point at the instruction
//! after the call. Both backends resolve `address - 1` so the reported line is
//! the one containing the call, not the statement after it.

pub mod memory_maps;
pub mod native;
pub mod qualified_name;
pub mod symbolizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use memory_maps::{parse_memory_maps, MemoryRange};
pub use native::NativeFrames;
pub use qualified_name::split_qualified_name;
pub use symbolizer::DwarfSymbolizer;

/// Raw return address of one frame, stable for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub usize);

impl Address {
    /// Address of the call instruction that produced this return address.
    #[must_use]
    pub fn call_site(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

/// Start address of the entry-point function a stack walk is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor(usize);

impl Anchor {
    /// Anchor on the function starting at `function_address`.
    ///
    /// Pass a function item cast to an integer, e.g. `Anchor::new(here as usize)`.
    #[must_use]
    pub fn new(function_address: usize) -> Self {
        Self(function_address)
    }

    /// Returns true if `symbol_address` is the start of the anchor function.
    #[must_use]
    pub fn matches(self, symbol_address: usize) -> bool {
        symbol_address != 0 && symbol_address == self.0
    }
}

/// Function, source file and line an address resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Demangled, fully qualified function name without the mangling hash
    pub name: String,
    /// Source path as recorded in the debug info
    pub file: PathBuf,
    /// 1-based source line
    pub line: u32,
}

/// Platform capability for walking the calling thread's stack and mapping
/// addresses back to source.
pub trait FrameSource: Send + Sync {
    /// Return up to `count` return addresses, starting `skip` frames above
    /// the caller of `anchor`.
    ///
    /// Fewer addresses are returned when the stack is exhausted, and none at
    /// all when the anchor frame is not on the stack.
    fn frames_from(&self, anchor: Anchor, skip: usize, count: usize) -> Vec<Address>;

    /// Resolve a return address to its call site.
    ///
    /// Returns `None` when the function name, file or line is unavailable.
    fn resolve(&self, address: Address) -> Option<Symbol>;
}

impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    fn frames_from(&self, anchor: Anchor, skip: usize, count: usize) -> Vec<Address> {
        (**self).frames_from(anchor, skip, count)
    }

    fn resolve(&self, address: Address) -> Option<Symbol> {
        (**self).resolve(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_site_is_one_before_return_address() {
        assert_eq!(Address(0x1000).call_site(), Some(0xfff));
        assert_eq!(Address(0).call_site(), None);
    }

    #[test]
    fn test_anchor_never_matches_null() {
        assert!(Anchor::new(0x4000).matches(0x4000));
        assert!(!Anchor::new(0x4000).matches(0x4001));
        assert!(!Anchor::new(0).matches(0));
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address(0x55f3_a2b4_c780).to_string(), "0x000055f3a2b4c780");
    }
}
