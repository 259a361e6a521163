use std::collections::HashSet;

use once_cell::sync::Lazy;

// Polysyllabic entries of the Dale-Chall list of familiar words (Dale and
// Chall, 1948), lower-cased. One-syllable words are never difficult, so the
// list leaves them out.
const EASY_WORD_LIST: &str = include_str!("easy_words.txt");

static EASY_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    EASY_WORD_LIST
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
});

/// `word` must already be lower-cased.
pub fn is_easy_word(word: &str) -> bool {
    EASY_WORDS.contains(word)
}
