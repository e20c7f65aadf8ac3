//! Resolver configuration
//!
//! The process-wide resolver reads its configuration from the environment the
//! first time a call site is resolved:
//!
//! - `CALLSITE_SYMBOLIZER=native` (default): resolve through `backtrace`
//! - `CALLSITE_SYMBOLIZER=dwarf`: resolve through the executable's DWARF info,
//!   loaded once with `addr2line`

use log::warn;
use std::fmt;
use std::str::FromStr;

use crate::domain::ConfigError;

/// Environment variable selecting the symbolization backend
pub const SYMBOLIZER_ENV: &str = "CALLSITE_SYMBOLIZER";

/// Symbolization backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// `backtrace::resolve`
    #[default]
    Native,
    /// `addr2line` over the running executable
    Dwarf,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "backtrace" => Ok(Backend::Native),
            "dwarf" | "addr2line" => Ok(Backend::Dwarf),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => f.write_str("native"),
            Backend::Dwarf => f.write_str("dwarf"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub backend: Backend,
}

impl Config {
    /// Read the configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if `CALLSITE_SYMBOLIZER` names an unknown backend
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var(std::env::var(SYMBOLIZER_ENV).ok().as_deref())
    }

    /// Build a configuration from the value of `CALLSITE_SYMBOLIZER`.
    ///
    /// # Errors
    /// Returns an error if `value` names an unknown backend
    pub fn from_var(value: Option<&str>) -> Result<Self, ConfigError> {
        let backend = match value {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Backend::default(),
        };
        Ok(Self { backend })
    }

    /// Like [`Config::from_env`], falling back to the defaults on error.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            warn!("{e}, using the {} backend", Backend::default());
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_native() {
        assert_eq!(Config::from_var(None), Ok(Config { backend: Backend::Native }));
        assert_eq!(Config::from_var(Some("  ")), Ok(Config { backend: Backend::Native }));
    }

    #[test]
    fn test_backend_names_are_case_insensitive() {
        assert_eq!(Config::from_var(Some("DWARF")).unwrap().backend, Backend::Dwarf);
        assert_eq!(Config::from_var(Some(" Native ")).unwrap().backend, Backend::Native);
        assert_eq!("addr2line".parse::<Backend>(), Ok(Backend::Dwarf));
    }

    #[test]
    fn test_unknown_backend() {
        assert_eq!(
            Config::from_var(Some("gdb")),
            Err(ConfigError::UnknownBackend("gdb".to_string()))
        );
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in [Backend::Native, Backend::Dwarf] {
            assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
        }
    }
}
