//! Resolving a single frame

use log::{debug, trace};

use super::{clamp_offset, Resolver};
use crate::domain::Location;
use crate::symbolization::{Address, Anchor};

impl Resolver {
    /// Resolve the frame `offset` frames above the caller of `anchor`.
    ///
    /// Offset 0 is the caller's own site, 1 its caller, and so on; negative
    /// offsets are clamped to 0. A frame beyond the end of the stack, or one
    /// without debug info, yields [`Location::default()`].
    pub fn locate(&self, anchor: Anchor, offset: isize) -> Location {
        let skip = clamp_offset(offset);
        match self.source.frames_from(anchor, skip, 1).first() {
            Some(&address) => self.resolve_address(address),
            None => {
                trace!("No frame at offset {skip}");
                Location::default()
            }
        }
    }

    /// Resolve one return address, consulting the cache first.
    pub fn resolve_address(&self, address: Address) -> Location {
        if let Some(cached) = self.cache.lookup(address) {
            return cached;
        }

        let location = self
            .source
            .resolve(address)
            .map(|symbol| Location::from_symbol(&symbol))
            .unwrap_or_default();

        // Stored before logging: a logger that itself asks for call sites
        // then hits the cache instead of recursing
        self.cache.store(address, location.clone());

        if location.is_unresolved() {
            debug!("Address {address} did not resolve to a call site");
        } else {
            debug!("Resolved {address} -> {location}");
        }
        location
    }
}
