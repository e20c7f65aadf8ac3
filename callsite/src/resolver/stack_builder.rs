//! Capturing call stacks

use super::{clamp_depth, Resolver};
use crate::domain::{Location, Stack};
use crate::symbolization::Anchor;

impl Resolver {
    /// Capture `depth` frames above the caller of `anchor`, nearest first.
    ///
    /// `depth` is clamped to at least 1. Frames beyond the end of the stack
    /// are [`Location::default()`], so the result always has exactly the
    /// clamped depth.
    pub fn stack(&self, anchor: Anchor, depth: isize) -> Stack {
        let depth = clamp_depth(depth);

        // One walk for the whole run; frame `i` is the one `locate` would
        // find at offset `i`
        let mut frames: Vec<Location> = self
            .source
            .frames_from(anchor, 0, depth)
            .into_iter()
            .map(|address| self.resolve_address(address))
            .collect();
        frames.resize(depth, Location::default());

        Stack::from(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::FakeFrames;

    fn anchor() -> Anchor {
        Anchor::new(0x4000)
    }

    #[test]
    fn test_stack_is_nearest_first() {
        let resolver = Resolver::new(FakeFrames::chain(&["h", "g", "f", "main"]));

        let stack = resolver.stack(anchor(), 3);
        let functions: Vec<&str> = stack.iter().map(Location::function).collect();
        assert_eq!(functions, ["h", "g", "f"]);
    }

    #[test]
    fn test_depth_is_clamped_to_one() {
        let resolver = Resolver::new(FakeFrames::chain(&["h", "g"]));

        for depth in [0, -1, isize::MIN] {
            let stack = resolver.stack(anchor(), depth);
            assert_eq!(stack.len(), 1);
            assert_eq!(stack.get(0).map(Location::function), Some("h"));
        }
    }

    #[test]
    fn test_short_stack_is_padded_with_zero_locations() {
        let resolver = Resolver::new(FakeFrames::chain(&["h", "g"]));

        let stack = resolver.stack(anchor(), 4);
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.get(2), Some(&Location::default()));
        assert_eq!(
            stack.to_string(),
            "(myapp:main.rs:h:10) :: (myapp:main.rs:g:20) :: (:::0) :: (:::0)"
        );
    }

    #[test]
    fn test_stack_matches_individual_locations() {
        let resolver = Resolver::new(FakeFrames::chain(&["h", "g", "f"]));

        let stack = resolver.stack(anchor(), 3);
        for (offset, frame) in (0..).zip(stack.iter()) {
            assert_eq!(&resolver.locate(anchor(), offset), frame);
        }
    }

    #[test]
    fn test_stack_shares_cache_with_locate() {
        let resolver = Resolver::new(FakeFrames::chain(&["h", "g"]));

        resolver.stack(anchor(), 2);
        assert_eq!(resolver.cache().len(), 2);
        resolver.locate(anchor(), 1);
        assert_eq!(resolver.cache().stats().hits, 1);
    }
}
