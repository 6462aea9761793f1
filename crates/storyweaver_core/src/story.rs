//! crates/storyweaver_core/src/story.rs
//!
//! Reconciliation of a synthesis response against the original image
//! ordering. The model is asked for exactly one page per image, but the
//! response may come back incomplete, out of order, or with duplicate
//! indexes, so the consuming logic must never assume cardinality.

use crate::domain::StoryPage;

/// Substituted when a page cannot be matched either by index or by position.
pub const MISSING_SEGMENT_TEXT: &str = "The magical ink seems to have faded on this page...";

/// Aligns a response page list back to the input ordering.
///
/// For each input position `i`: take the first response page declaring
/// `image_index == i`, else the page at positional index `i`, else the
/// faded-ink placeholder. Total for any input - the result always has
/// exactly `expected` entries.
pub fn reconcile_segments(expected: usize, pages: &[StoryPage]) -> Vec<String> {
    (0..expected)
        .map(|i| {
            pages
                .iter()
                .find(|p| p.image_index as usize == i)
                .or_else(|| pages.get(i))
                .map(|p| p.story_segment.clone())
                .unwrap_or_else(|| MISSING_SEGMENT_TEXT.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(image_index: u32, text: &str) -> StoryPage {
        StoryPage {
            image_index,
            story_segment: text.to_string(),
        }
    }

    #[test]
    fn matches_by_declared_index_regardless_of_order() {
        let pages = vec![page(2, "end"), page(0, "start"), page(1, "middle")];
        let segments = reconcile_segments(3, &pages);
        assert_eq!(segments, vec!["start", "middle", "end"]);
    }

    #[test]
    fn falls_back_to_position_when_index_is_missing() {
        // Indexes are nonsense, so every slot resolves positionally.
        let pages = vec![page(7, "first"), page(7, "second")];
        let segments = reconcile_segments(2, &pages);
        assert_eq!(segments, vec!["first", "second"]);
    }

    #[test]
    fn substitutes_placeholder_for_absent_pages() {
        let pages = vec![page(0, "only page")];
        let segments = reconcile_segments(3, &pages);
        assert_eq!(segments[0], "only page");
        // Position 1 falls back to nothing at index 1... except pages[1] is
        // absent too, so both trailing slots get the placeholder.
        assert_eq!(segments[1], MISSING_SEGMENT_TEXT);
        assert_eq!(segments[2], MISSING_SEGMENT_TEXT);
    }

    #[test]
    fn duplicate_indexes_resolve_to_the_first_match() {
        let pages = vec![page(0, "first claim"), page(0, "second claim"), page(1, "two")];
        let segments = reconcile_segments(2, &pages);
        assert_eq!(segments, vec!["first claim", "two"]);
    }

    #[test]
    fn always_yields_exactly_one_entry_per_input() {
        for expected in 0..6 {
            let pages = vec![page(3, "x"), page(3, "y")];
            assert_eq!(reconcile_segments(expected, &pages).len(), expected);
        }
        assert!(reconcile_segments(4, &[]).iter().all(|s| s == MISSING_SEGMENT_TEXT));
    }

    #[test]
    fn extra_pages_beyond_the_input_are_dropped() {
        let pages = vec![page(0, "a"), page(1, "b"), page(2, "surplus")];
        let segments = reconcile_segments(2, &pages);
        assert_eq!(segments, vec!["a", "b"]);
    }
}
