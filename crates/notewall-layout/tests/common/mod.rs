//! Shared fixtures for layout integration tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: [&str; 12] = [
    "be", "strong", "and", "courageous", "do", "not", "fear", "grace", "unshakeable",
    "tomorrow", "日本語", "x",
];

/// Generates `count` deterministic pseudo-random note lists.
#[allow(dead_code)]
pub fn random_note_lists(seed: u64, count: usize) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let notes = rng.random_range(1..=6);
            (0..notes)
                .map(|_| {
                    let words = rng.random_range(1..=24);
                    (0..words)
                        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        })
        .collect()
}

/// One long note of roughly 200 characters.
#[allow(dead_code)]
pub fn long_note(index: usize) -> String {
    format!(
        "Note {index}: whatever is true, whatever is noble, whatever is right, whatever is \
         pure, whatever is lovely, whatever is admirable, if anything is excellent or \
         praiseworthy, think about such things."
    )
}
