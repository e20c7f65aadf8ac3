//! Splitting demangled Rust paths into package and function
//!
//! A demangled symbol such as `myapp::net::Session::close` carries the module
//! path, the receiver type and the function in a single `::`-delimited
//! string. Call sites report them separately:
//!
//! | Qualified name                                   | Package        | Function           |
//! |--------------------------------------------------|----------------|--------------------|
//! | `myapp::net::connect`                            | `myapp/net`    | `connect`          |
//! | `myapp::net::Session::close`                     | `myapp/net`    | `close`            |
//! | `<myapp::net::Session as core::ops::Drop>::drop` | `myapp/net`    | `drop`             |
//! | `<u32 as myapp::codec::Encode>::encode`          | `myapp/codec`  | `encode`           |
//! | `myapp::worker::run::{{closure}}`                | `myapp/worker` | `run::{{closure}}` |
//!
//! Rules, applied in order:
//! 1. A trailing legacy mangling hash (`h` + 16 hex digits) is dropped.
//! 2. The path is split on `::` outside of `<...>`; turbofish segments
//!    (`::<T>`) are dropped.
//! 3. A leading qualified-self segment (`<Type as Trait>` or `<Type>`) is
//!    replaced by the path of `Type`, whose last segment is the receiver.
//!    When `Type` has no module path (primitives, generic parameters) or
//!    lives in `core`, `alloc` or `std`, the impl belongs to the trait's
//!    crate and the module path of `Trait` is used instead.
//! 4. The function starts at the last plain identifier; closure and shim
//!    segments after it stay attached.
//! 5. A type segment directly before the function is the receiver and is
//!    dropped. The remaining prefix, joined with `/`, is the package.

/// Split a demangled, fully qualified function name into `(package, function)`.
///
/// A name with a single segment (e.g. a C symbol like `main`) has an empty
/// package.
#[must_use]
pub fn split_qualified_name(qualified: &str) -> (String, String) {
    let mut segments = path_segments(qualified.trim());

    if segments.last().is_some_and(|s| is_legacy_hash(s)) {
        segments.pop();
    }

    // Expand `<Type as Trait>` into a module path followed by the receiver
    let mut receiver = None;
    if let Some(first) = segments.first().copied().filter(|s| s.starts_with('<')) {
        let (self_type, trait_path) = qualified_self(first);
        let mut self_path = path_segments(self_type);

        if self_path.len() <= 1 || self_path.first().is_some_and(|s| is_std_crate(s)) {
            let mut trait_modules = trait_path.map(path_segments).unwrap_or_default();
            trait_modules.pop();
            if !trait_modules.is_empty() {
                let self_name = self_path.pop().unwrap_or(self_type);
                trait_modules.push(self_name);
                self_path = trait_modules;
            }
        }

        receiver = self_path.len().checked_sub(1);
        segments.splice(0..1, self_path);
    }

    let segments: Vec<&str> = segments
        .into_iter()
        .enumerate()
        .filter(|(idx, segment)| *idx == 0 || !segment.starts_with('<'))
        .map(|(_, segment)| segment)
        .collect();

    if segments.is_empty() {
        return (String::new(), String::new());
    }

    let function_start =
        segments.iter().rposition(|s| is_identifier(s)).unwrap_or(segments.len() - 1);

    let mut package_end = function_start;
    if let Some(prev) = function_start.checked_sub(1) {
        if receiver == Some(prev) || is_type_segment(segments[prev]) {
            package_end = prev;
        }
    }

    let package = segments[..package_end].join("/");
    let function = segments[function_start..].join("::");
    (package, function)
}

/// Split a path on `::`, ignoring separators nested inside `<...>`.
fn path_segments(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b'<' => depth += 1,
            // `->` in fn pointer types is not a closing bracket
            b'>' if idx > 0 && bytes[idx - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(idx + 1) == Some(&b':') => {
                segments.push(&path[start..idx]);
                idx += 2;
                start = idx;
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    segments.push(&path[start..]);

    segments.retain(|s| !s.is_empty());
    segments
}

/// Extract `Type` and `Trait` from `<Type as Trait>`, or `Type` from `<Type>`.
fn qualified_self(segment: &str) -> (&str, Option<&str>) {
    let inner = segment.strip_prefix('<').unwrap_or(segment);
    let inner = inner.strip_suffix('>').unwrap_or(inner);

    let bytes = inner.as_bytes();
    let mut depth = 0usize;
    let mut self_type = inner;
    let mut trait_path = None;
    for (idx, &byte) in bytes.iter().enumerate() {
        match byte {
            b'<' => depth += 1,
            b'>' if idx > 0 && bytes[idx - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 && inner[idx..].starts_with(" as ") => {
                self_type = &inner[..idx];
                trait_path = Some(inner[idx + 4..].trim());
                break;
            }
            _ => {}
        }
    }

    let mut self_type = self_type.trim();
    for prefix in ["&", "*const ", "*mut ", "mut ", "dyn "] {
        while let Some(rest) = self_type.strip_prefix(prefix) {
            self_type = rest.trim_start();
        }
    }
    (self_type, trait_path)
}

/// Crates whose impls of user traits are written in the user's crate
fn is_std_crate(segment: &str) -> bool {
    matches!(segment, "core" | "alloc" | "std")
}

fn is_legacy_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Plain identifiers: `connect`, `Session`, `r#type`. Not `{{closure}}` or `<T>`.
fn is_identifier(segment: &str) -> bool {
    let segment = segment.strip_prefix("r#").unwrap_or(segment);
    segment.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Types are `UpperCamelCase` by convention, optionally with generic arguments.
fn is_type_segment(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_uppercase())
}
