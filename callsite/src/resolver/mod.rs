//! Call-site resolution
//!
//! ```text
//! Stack Builder (dive) ──▶ Location Resolver (here, at) ──▶ LocationCache
//!                                                              │ miss
//!                                                              ▼
//!                                                         FrameSource
//! ```
//!
//! - [`location_resolver`]: one frame at an offset, through the cache
//! - [`stack_builder`]: a run of frames at increasing offsets
//! - [`cache`]: the address to location memo
//!
//! A [`Resolver`] owns its frame source and its cache. The crate-level
//! functions share one process-wide resolver built on first use from
//! [`Config::from_env_or_default`].

pub mod cache;
pub mod location_resolver;
pub mod stack_builder;

use log::{debug, warn};
use std::sync::OnceLock;

use crate::config::{Backend, Config};
use crate::symbolization::{DwarfSymbolizer, FrameSource, NativeFrames};

pub use cache::{CacheStats, LocationCache};

/// Resolves call sites through a [`FrameSource`], memoizing by address.
pub struct Resolver {
    source: Box<dyn FrameSource>,
    cache: LocationCache,
}

impl Resolver {
    /// Create a resolver with its own, empty cache.
    pub fn new<S: FrameSource + 'static>(source: S) -> Self {
        Self { source: Box::new(source), cache: LocationCache::new() }
    }

    /// Create a resolver for the configured backend.
    ///
    /// Falls back to [`NativeFrames`] when the DWARF backend cannot load
    /// the executable's debug info.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        debug!("Using the {} symbolizer backend", config.backend);
        match config.backend {
            Backend::Native => Self::new(NativeFrames),
            Backend::Dwarf => match DwarfSymbolizer::for_current_exe() {
                Ok(symbolizer) => Self::new(symbolizer),
                Err(e) => {
                    warn!("DWARF symbolizer unavailable ({e:#}), using the native backend");
                    Self::new(NativeFrames)
                }
            },
        }
    }

    /// The address to location memo used by this resolver
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }
}

static GLOBAL: OnceLock<Resolver> = OnceLock::new();

/// Get the process-wide resolver, creating it on first access.
pub fn global() -> &'static Resolver {
    GLOBAL.get_or_init(|| Resolver::from_config(&Config::from_env_or_default()))
}

/// Offsets at or below zero all mean "the caller's own site".
fn clamp_offset(offset: isize) -> usize {
    usize::try_from(offset).unwrap_or(0)
}

/// A stack always has at least one frame.
fn clamp_depth(depth: isize) -> usize {
    usize::try_from(depth).unwrap_or(0).max(1)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic [`FrameSource`] with synthetic frames

    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::symbolization::{Address, Anchor, FrameSource, Symbol};

    /// Frames listed nearest first, each with an optional symbol
    pub struct FakeFrames {
        frames: Vec<(Address, Option<Symbol>)>,
        resolutions: AtomicUsize,
    }

    impl FakeFrames {
        pub fn new(frames: Vec<(Address, Option<Symbol>)>) -> Self {
            Self { frames, resolutions: AtomicUsize::new(0) }
        }

        /// Frames `0x1000, 0x2000, ...` in `myapp::<name>` at `main.rs:<10 * n>`
        pub fn chain(functions: &[&str]) -> Self {
            Self::new(
                functions
                    .iter()
                    .zip(1..)
                    .map(|(function, n)| {
                        let symbol = Symbol {
                            name: format!("myapp::{function}"),
                            file: PathBuf::from("/srv/myapp/src/main.rs"),
                            line: 10 * n,
                        };
                        (Address(0x1000 * n as usize), Some(symbol))
                    })
                    .collect(),
            )
        }

        pub fn resolutions(&self) -> usize {
            self.resolutions.load(Ordering::SeqCst)
        }
    }

    impl FrameSource for FakeFrames {
        fn frames_from(&self, _anchor: Anchor, skip: usize, count: usize) -> Vec<Address> {
            self.frames.iter().skip(skip).take(count).map(|(address, _)| *address).collect()
        }

        fn resolve(&self, address: Address) -> Option<Symbol> {
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            self.frames.iter().find(|(a, _)| *a == address).and_then(|(_, symbol)| symbol.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_offset() {
        assert_eq!(clamp_offset(-7), 0);
        assert_eq!(clamp_offset(0), 0);
        assert_eq!(clamp_offset(3), 3);
    }

    #[test]
    fn test_clamp_depth() {
        assert_eq!(clamp_depth(isize::MIN), 1);
        assert_eq!(clamp_depth(0), 1);
        assert_eq!(clamp_depth(1), 1);
        assert_eq!(clamp_depth(16), 16);
    }

    #[test]
    fn test_native_config_builds_resolver() {
        let resolver = Resolver::from_config(&Config::default());
        assert!(resolver.cache().is_empty());
    }
}
