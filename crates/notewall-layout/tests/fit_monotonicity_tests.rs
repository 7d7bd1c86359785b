//! Property-style check that the fit predicate is non-increasing in size.

mod common;

use notewall_layout::TextLayoutEngine;

#[test]
fn fit_monotonicity_tests_larger_sizes_never_fit_after_a_miss() {
    let engine = TextLayoutEngine::monospace();
    for (index, notes) in common::random_note_lists(42, 150).into_iter().enumerate() {
        let width = 200 + (index as u32 * 37) % 900;
        let height = 150 + (index as u32 * 53) % 1200;

        let mut missed_at = None;
        for size in 1..=96 {
            let fits = engine.fits(&notes, size, width, height);
            if let Some(first_miss) = missed_at {
                assert!(
                    !fits,
                    "size {size} fits after size {first_miss} missed ({width}x{height}, {notes:?})"
                );
            } else if !fits {
                missed_at = Some(size);
            }
        }
    }
}
