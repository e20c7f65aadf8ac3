//! # callsite - Call-Site Resolution for Logging and Error Reporting
//!
//! callsite answers "where was I called from?" at runtime: the package,
//! file, function and line of the current call site or of any ancestor
//! frame, and ordered runs of them as a call stack. Logging, tracing and
//! error-reporting code uses it to attribute a message to its origin.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                here()   at(offset)   dive(depth)            │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ anchored on the entry point
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  resolver: Stack Builder ──▶ Location Resolver ──▶ Cache    │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ cache miss
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  symbolization: FrameSource                                 │
//! │   • NativeFrames    (backtrace::trace + backtrace::resolve) │
//! │   • DwarfSymbolizer (backtrace::trace + addr2line)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: [`Location`] and [`Stack`] values and configuration errors
//! - [`resolver`]: the process-wide [`Resolver`], its cache and stack builder
//! - [`symbolization`]: stack walking, address resolution and symbol name splitting
//! - [`config`]: backend selection through `CALLSITE_SYMBOLIZER`
//!
//! ## Failure Model
//!
//! Nothing here returns an error. A frame past the end of the stack, or
//! one without debug info, comes back as [`Location::default()`], which
//! prints as `(:::0)`.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! fn log_error(message: &str) {
//!     // Attribute the message to whoever called log_error
//!     let origin = callsite::at(1);
//!     eprintln!("{origin} {message}");
//! }
//! ```
//!
//! Resolution needs debug info, so keep `debug = true` (or at least
//! `debug = "line-tables-only"`) in release profiles.
//!
//! Offsets count the frames that are physically on the stack. A function
//! whose last action is calling another (`fn g() -> Stack { h() }`) may be
//! compiled into a tail call in optimized builds, and its frame then no
//! longer appears to [`at`] and [`dive`].

pub mod config;
pub mod domain;
pub mod resolver;
pub mod symbolization;

pub use config::{Backend, Config};
pub use domain::{Location, Stack};
pub use resolver::Resolver;

use symbolization::Anchor;

/// Location of the code calling `here`.
#[inline(never)]
#[must_use]
pub fn here() -> Location {
    let location = resolver::global().locate(Anchor::new(here as usize), 0);
    // Keeps this frame on the stack until the walk above has finished
    std::hint::black_box(location)
}

/// Location `offset` frames above the code calling `at`.
///
/// `at(0)` is the caller's own site, `at(1)` its caller's, and so on.
/// Offsets below zero are treated as zero. Frames past the end of the stack
/// resolve to [`Location::default()`].
#[inline(never)]
#[must_use]
pub fn at(offset: isize) -> Location {
    let location = resolver::global().locate(Anchor::new(at as usize), offset);
    std::hint::black_box(location)
}

/// Call stack of `depth` frames, starting at the code calling `dive`.
///
/// Depths below one are treated as one. The stack always has exactly that
/// many frames; those past the real end of the stack are
/// [`Location::default()`].
#[inline(never)]
#[must_use]
pub fn dive(depth: isize) -> Stack {
    let stack = resolver::global().stack(Anchor::new(dive as usize), depth);
    std::hint::black_box(stack)
}
