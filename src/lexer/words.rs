//! Plausibility check for identifiers when the language is unknown.
//!
//! Without a language there is no reserved-word table to lean on, so the
//! scanner only accepts identifier-shaped runs that read like words. Keyboard
//! mashing such as `xqzvbn` or `asasas` is reported instead of being passed
//! on as code.

use crate::language::Language;

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 30;
const MAX_CONSONANT_RUN: usize = 4;

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Returns true if `word` is plausible as an identifier.
pub fn looks_like_word(word: &str) -> bool {
    if Language::ALL
        .iter()
        .any(|lang| *lang != Language::Unknown && lang.profile().is_keyword(word))
    {
        return true;
    }

    let letters: Vec<char> = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if letters.len() < MIN_LEN || word.len() > MAX_LEN {
        return false;
    }

    let has_vowel = letters.iter().any(|c| is_vowel(*c));
    let has_consonant = letters.iter().any(|c| !is_vowel(*c));
    if !has_vowel || !has_consonant {
        return false;
    }

    if has_long_run(&letters) || consonant_run(&letters) > MAX_CONSONANT_RUN {
        return false;
    }

    !is_repetition(&letters)
}

/// Three or more identical letters in a row.
fn has_long_run(letters: &[char]) -> bool {
    letters.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

fn consonant_run(letters: &[char]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in letters {
        if is_vowel(*c) {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// The whole word is one short unit repeated (`abab`, `xyzxyz`).
fn is_repetition(letters: &[char]) -> bool {
    let len = letters.len();
    if len < 4 {
        return false;
    }
    (1..=len / 2)
        .filter(|unit| len % unit == 0)
        .any(|unit| letters.chunks(unit).all(|chunk| chunk == &letters[..unit]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_words() {
        assert!(looks_like_word("total"));
        assert!(looks_like_word("count_items"));
        assert!(looks_like_word("Value2"));
        assert!(looks_like_word("length"));
    }

    #[test]
    fn test_accepts_known_keywords() {
        assert!(looks_like_word("if"));
        assert!(looks_like_word("def"));
    }

    #[test]
    fn test_rejects_noise() {
        assert!(!looks_like_word("xqzvbn"));
        assert!(!looks_like_word("asasas"));
        assert!(!looks_like_word("aaab"));
        assert!(!looks_like_word("q"));
        assert!(!looks_like_word("bcd"));
    }
}
