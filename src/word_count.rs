//! Lexical tokenization shared by the statistics analyzer.
//!
//! A word is a whitespace-separated token with punctuation removed. CJK,
//! kana and hangul characters are not space-delimited, so each one counts as
//! a word of its own.

pub fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();

    for token in input.split_whitespace() {
        let mut current = String::new();
        for ch in token.chars() {
            if is_cjk_like(ch) {
                push_word(&mut current, &mut words);
                words.push(ch.to_string());
            } else if ch.is_alphanumeric() || is_apostrophe(ch) {
                current.push(ch);
            }
        }
        push_word(&mut current, &mut words);
    }

    words
}

pub fn count_words(input: &str) -> usize {
    words(input).len()
}

fn push_word(current: &mut String, words: &mut Vec<String>) {
    if current.chars().any(char::is_alphanumeric) {
        words.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn is_apostrophe(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}')
}

fn is_cjk_like(ch: char) -> bool {
    is_cjk(ch) || is_hiragana(ch) || is_katakana(ch) || is_hangul(ch)
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0x2F800..=0x2FA1F
    )
}

fn is_hiragana(ch: char) -> bool {
    matches!(ch as u32, 0x3040..=0x309F)
}

fn is_katakana(ch: char) -> bool {
    matches!(ch as u32, 0x30A0..=0x30FF)
}

fn is_hangul(ch: char) -> bool {
    matches!(ch as u32, 0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF)
}
