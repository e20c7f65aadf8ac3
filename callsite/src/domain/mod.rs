//! Domain model for callsite
//!
//! This module contains the value types handed to callers and the errors
//! raised while configuring the resolver:
//! - [`Location`]: one resolved call site
//! - [`Stack`]: an ordered run of call sites, nearest caller first
//! - [`ConfigError`]: invalid resolver configuration

pub mod errors;
pub mod location;

pub use errors::ConfigError;
pub use location::{Location, Stack};
