//! Resolved call sites and call stacks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::symbolization::{split_qualified_name, Symbol};

/// One resolved call site.
///
/// A location is either fully resolved (every field populated) or equal to
/// [`Location::default()`], which stands for "no location available". The
/// zero value formats as `(:::0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LocationFields")]
pub struct Location {
    package: String,
    file: String,
    function: String,
    line: u32,
}

/// Wire form of a [`Location`], validated through [`Location::new`]
#[derive(Deserialize)]
struct LocationFields {
    package: String,
    file: String,
    function: String,
    line: u32,
}

impl From<LocationFields> for Location {
    fn from(fields: LocationFields) -> Self {
        Self::new(fields.package, fields.file, fields.function, fields.line)
    }
}

impl Location {
    /// Build a location from its parts.
    ///
    /// If any part is empty (or `line` is 0) the zero location is returned,
    /// so a partially populated value can never be observed.
    #[must_use]
    pub fn new(
        package: impl Into<String>,
        file: impl Into<String>,
        function: impl Into<String>,
        line: u32,
    ) -> Self {
        let (package, file, function) = (package.into(), file.into(), function.into());
        if package.is_empty() || file.is_empty() || function.is_empty() || line == 0 {
            return Self::default();
        }
        Self { package, file, function, line }
    }

    /// Derive a location from a resolved symbol.
    ///
    /// The qualified function name is split into package and function and
    /// the source path is reduced to its base name.
    #[must_use]
    pub fn from_symbol(symbol: &Symbol) -> Self {
        let (package, function) = split_qualified_name(&symbol.name);
        let file = base_name(&symbol.file);
        Self::new(package, file, function, symbol.line)
    }

    /// Slash-delimited module path, e.g. `myapp/net/session`
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Source file name without its directory
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Function name without module path or receiver type
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// 1-based source line, 0 when unresolved
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns true if this is the zero location.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{}:{}:{})", self.package, self.file, self.function, self.line)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

/// A captured call stack, nearest caller first.
///
/// Index 0 is the frame closest to the capture point. Frames beyond the
/// real depth of the stack are zero locations, so the length is always the
/// depth that was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stack(Vec<Location>);

impl Stack {
    /// Number of frames in the stack
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frame at `index`, where 0 is the nearest caller.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Location> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Location] {
        &self.0
    }
}

impl From<Vec<Location>> for Stack {
    fn from(frames: Vec<Location>) -> Self {
        Self(frames)
    }
}

impl IntoIterator for Stack {
    type Item = Location;
    type IntoIter = std::vec::IntoIter<Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, location) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" :: ")?;
            }
            write!(f, "{location}")?;
        }
        Ok(())
    }
}
