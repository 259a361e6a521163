use std::collections::HashSet;

use serde::Serialize;

use crate::easy_words::is_easy_word;
use crate::error::ConversionError;
use crate::syllables::count_syllables;
use crate::word_count;

pub const WORDS_PER_MINUTE: f64 = 200.0;

// Flesch Reading Ease
const EASE_BASE: f64 = 206.835;
const EASE_SENTENCE_WEIGHT: f64 = 1.015;
const EASE_SYLLABLE_WEIGHT: f64 = 84.6;

// Flesch-Kincaid Grade Level
const GRADE_SENTENCE_WEIGHT: f64 = 0.39;
const GRADE_SYLLABLE_WEIGHT: f64 = 11.8;
const GRADE_OFFSET: f64 = 15.59;

/// Lexical, readability and structural metrics of a text. Scores are `0.0`
/// when the text contains no words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStatistics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub character_count: usize,
    pub character_count_no_spaces: usize,
    pub paragraph_count: usize,
    pub reading_ease: f64,
    pub grade_level: f64,
    pub difficult_words: usize,
    pub syllable_count: usize,
    pub avg_sentence_length: f64,
    pub reading_time_minutes: f64,
}

pub fn analyze(text: &str) -> Result<TextStatistics, ConversionError> {
    let words = word_count::words(text);
    let word_count = words.len();
    let sentence_count = count_sentences(text);
    let syllable_count: usize = words.iter().map(|word| count_syllables(word)).sum();

    let (reading_ease, grade_level, avg_sentence_length) = if word_count == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let words_per_sentence = word_count as f64 / sentence_count.max(1) as f64;
        let syllables_per_word = syllable_count as f64 / word_count as f64;
        (
            EASE_BASE
                - EASE_SENTENCE_WEIGHT * words_per_sentence
                - EASE_SYLLABLE_WEIGHT * syllables_per_word,
            GRADE_SENTENCE_WEIGHT * words_per_sentence
                + GRADE_SYLLABLE_WEIGHT * syllables_per_word
                - GRADE_OFFSET,
            words_per_sentence,
        )
    };

    let stats = TextStatistics {
        word_count,
        sentence_count,
        character_count: text.chars().count(),
        character_count_no_spaces: text.chars().filter(|ch| !ch.is_whitespace()).count(),
        paragraph_count: count_paragraphs(text),
        reading_ease: round_to(reading_ease, 2),
        grade_level: round_to(grade_level, 2),
        difficult_words: count_difficult_words(&words),
        syllable_count,
        avg_sentence_length: round_to(avg_sentence_length, 2),
        reading_time_minutes: round_to(word_count as f64 / WORDS_PER_MINUTE, 1),
    };

    let scores = [
        stats.reading_ease,
        stats.grade_level,
        stats.avg_sentence_length,
        stats.reading_time_minutes,
    ];
    if scores.iter().any(|score| !score.is_finite()) {
        return Err(ConversionError::Internal(format!(
            "non-finite readability score in {scores:?}"
        )));
    }
    Ok(stats)
}

/// Rounds half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// A sentence ends at a run of `.`, `!` or `?` (plus closing quotes or
/// brackets) followed by whitespace or the end of the text. Text after the
/// last terminator is a sentence too; segments without words are ignored.
pub fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_terminator(ch) {
            continue;
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !(is_terminator(next) || is_closing_mark(next)) {
                break;
            }
            end = next_idx + next.len_utf8();
            chars.next();
        }

        if chars.peek().is_none_or(|&(_, next)| next.is_whitespace()) {
            if word_count::count_words(&text[start..end]) > 0 {
                count += 1;
            }
            start = end;
        }
    }

    if word_count::count_words(&text[start..]) > 0 {
        count += 1;
    }
    count
}

pub fn count_paragraphs(text: &str) -> usize {
    text.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .count()
}

/// Distinct words of two or more syllables missing from the easy-word list.
pub fn count_difficult_words(words: &[String]) -> usize {
    words
        .iter()
        .map(|word| word.to_lowercase().replace('\u{2019}', "'"))
        .filter(|word| count_syllables(word) >= 2 && !is_easy_word(word))
        .collect::<HashSet<_>>()
        .len()
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '…')
}

fn is_closing_mark(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.011,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_text_is_all_zero() {
        let stats = analyze("").unwrap();
        assert_eq!(
            stats,
            TextStatistics {
                word_count: 0,
                sentence_count: 0,
                character_count: 0,
                character_count_no_spaces: 0,
                paragraph_count: 0,
                reading_ease: 0.0,
                grade_level: 0.0,
                difficult_words: 0,
                syllable_count: 0,
                avg_sentence_length: 0.0,
                reading_time_minutes: 0.0,
            }
        );
    }

    #[test]
    fn punctuation_only_text_has_no_sentences() {
        let stats = analyze("?!... ---").unwrap();
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.reading_ease, 0.0);
        assert_eq!(stats.character_count, 9);
    }

    #[test]
    fn simple_sentence_matches_flesch_reference() {
        let stats = analyze("The cat sat on the mat.").unwrap();
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.sentence_count, 1);
        assert_eq!(stats.syllable_count, 6);
        assert_close(stats.reading_ease, 116.15);
        assert_close(stats.grade_level, -1.45);
        assert_close(stats.avg_sentence_length, 6.0);
        assert_eq!(stats.difficult_words, 0);
    }

    #[test]
    fn counts_multiple_sentences() {
        let stats = analyze("Hello world. This is a test! Is it working?").unwrap();
        assert_eq!(stats.word_count, 9);
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(stats.syllable_count, 11);
        assert_close(stats.avg_sentence_length, 3.0);
        // 206.835 - 1.015 * 3 - 84.6 * 11 / 9
        assert_close(stats.reading_ease, 100.39);
    }

    #[test]
    fn sentence_boundaries_need_trailing_whitespace() {
        assert_eq!(count_sentences("Pi is 3.14 today. Really?"), 2);
        assert_eq!(count_sentences("Wait... what?! \"Yes.\" Done"), 4);
        assert_eq!(count_sentences("no terminator"), 1);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn character_counts_use_code_points() {
        let stats = analyze("héllo wörld\nok").unwrap();
        assert_eq!(stats.character_count, 14);
        assert_eq!(stats.character_count_no_spaces, 12);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(count_paragraphs("First para.\n\nSecond para.\n\n\n\nThird."), 3);
        assert_eq!(count_paragraphs("one line\nstill one"), 1);
        assert_eq!(count_paragraphs("\n\n  \n\n"), 0);
    }

    #[test]
    fn difficult_words_are_distinct_and_polysyllabic() {
        let stats = analyze("The extraordinary phenomenon. Extraordinary!").unwrap();
        assert_eq!(stats.difficult_words, 2);
        let stats = analyze("Water and apples, yellow water.").unwrap();
        assert_eq!(stats.difficult_words, 1, "only 'apples' is off the list");
        let stats = analyze("Are you ready? A question for my uncle.").unwrap();
        assert_eq!(stats.difficult_words, 0);
    }

    #[test]
    fn reading_time_assumes_two_hundred_words_per_minute() {
        let text = "word ".repeat(333);
        let stats = analyze(&text).unwrap();
        assert_eq!(stats.word_count, 333);
        assert_eq!(stats.reading_time_minutes, 1.7);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(-1.455, 1), -1.5);
        assert_eq!(round_to(2.0, 2), 2.0);
    }
}
