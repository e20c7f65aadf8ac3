//! Structured error types for callsite
//!
//! Call-site resolution itself never fails (it degrades to a zero-valued
//! [`Location`](super::Location)). Errors only exist while choosing and
//! loading a symbolization backend.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown symbolizer backend '{0}' (expected 'native' or 'dwarf')")]
    UnknownBackend(String),
}
