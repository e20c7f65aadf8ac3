//! Stack walking and symbol resolution through the `backtrace` crate

use log::trace;
use std::ffi::c_void;

use super::{Address, Anchor, FrameSource, Symbol};

/// Default [`FrameSource`]: `backtrace::trace` for the walk and
/// `backtrace::resolve` for symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFrames;

impl FrameSource for NativeFrames {
    fn frames_from(&self, anchor: Anchor, skip: usize, count: usize) -> Vec<Address> {
        walk_from(anchor, skip, count)
    }

    fn resolve(&self, address: Address) -> Option<Symbol> {
        let call_site = address.call_site()?;
        let mut resolved = None;

        // Inlined frames are reported innermost first; keep the first one
        // that names a function.
        backtrace::resolve(call_site as *mut c_void, |symbol| {
            if resolved.is_some() {
                return;
            }
            let Some(name) = symbol.name() else { return };
            resolved = Some(Symbol {
                name: format!("{name:#}"),
                file: symbol.filename().map(std::path::Path::to_path_buf).unwrap_or_default(),
                line: symbol.lineno().unwrap_or(0),
            });
        });

        resolved.filter(|symbol| !symbol.file.as_os_str().is_empty() && symbol.line > 0)
    }
}

/// Collect up to `count` return addresses above the caller of `anchor`,
/// after skipping `skip` of them.
///
/// Shared by every backend, since they differ only in how addresses are
/// resolved.
pub(crate) fn walk_from(anchor: Anchor, skip: usize, count: usize) -> Vec<Address> {
    let mut addresses = Vec::with_capacity(count);
    if count == 0 {
        return addresses;
    }

    let mut anchored = false;
    let mut to_skip = skip;

    backtrace::trace(|frame| {
        if !anchored {
            anchored = anchor.matches(enclosing_function(frame));
            return true;
        }
        if to_skip > 0 {
            to_skip -= 1;
            return true;
        }

        let ip = frame.ip() as usize;
        if ip == 0 {
            return false;
        }
        addresses.push(Address(ip));
        addresses.len() < count
    });

    if !anchored {
        trace!("Anchor {anchor:?} not found on the stack");
    } else if addresses.len() < count {
        trace!("Stack exhausted after {} of {count} frames (skip = {skip})", addresses.len());
    }

    addresses
}

/// Start address of the function `frame` is executing.
fn enclosing_function(frame: &backtrace::Frame) -> usize {
    let start = frame.symbol_address() as usize;
    if start != frame.ip() as usize {
        return start;
    }

    // Unwinders without function bounds (e.g. compact unwind on macOS)
    // report the ip itself; fall back to the symbol table.
    let mut start = 0;
    backtrace::resolve_frame(frame, |symbol| {
        if start == 0 {
            start = symbol.addr().map_or(0, |addr| addr as usize);
        }
    });
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn anchored_walk(skip: usize, count: usize) -> Vec<Address> {
        let addresses = walk_from(Anchor::new(anchored_walk as usize), skip, count);
        std::hint::black_box(addresses)
    }

    #[inline(never)]
    fn resolve_own_call_site() -> Option<Symbol> {
        let addresses = anchored_walk(0, 1);
        NativeFrames.resolve(*addresses.first()?)
    }

    #[test]
    fn test_walk_respects_count() {
        assert_eq!(anchored_walk(0, 3).len(), 3);
        assert!(anchored_walk(0, 0).is_empty());
    }

    #[test]
    fn test_walk_skips_frames() {
        let all = anchored_walk(0, 4);
        let skipped = anchored_walk(1, 3);
        // Only the return address into this test function differs
        assert_eq!(all[1..], skipped[..]);
    }

    #[test]
    fn test_unknown_anchor_yields_nothing() {
        assert!(walk_from(Anchor::new(1), 0, 8).is_empty());
    }

    #[test]
    fn test_walk_past_stack_end_is_short() {
        assert!(anchored_walk(100_000, 1).is_empty());
    }

    #[test]
    fn test_resolves_calling_function() {
        let symbol = resolve_own_call_site().expect("call site should resolve in test builds");
        assert!(symbol.name.ends_with("resolve_own_call_site"), "got {}", symbol.name);
        assert_eq!(symbol.file.file_name().and_then(|f| f.to_str()), Some("native.rs"));
        assert!(symbol.line > 0);
    }

    #[test]
    fn test_null_address_does_not_resolve() {
        assert_eq!(NativeFrames.resolve(Address(0)), None);
    }
}
