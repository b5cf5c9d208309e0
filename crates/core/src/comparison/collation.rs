//! Language-aware ordering of bank names.
//!
//! Swedish sorts `å`, `ä`, `ö` after `z`; English folds them onto their base letters.

use crate::domain::locale::Language;
use std::cmp::Ordering;

const SPACE: u32 = 1;
const PUNCT: u32 = 2;
const DIGIT: u32 = 100;
const LETTER: u32 = 200;
const OTHER: u32 = 1_000;

pub fn compare_names(a: &str, b: &str, language: Language) -> Ordering {
    collation_key(a, language)
        .cmp(&collation_key(b, language))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str, language: Language) -> Vec<u32> {
    s.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| weight(ch, language))
        .collect()
}

fn weight(ch: char, language: Language) -> u32 {
    if ch.is_whitespace() {
        return SPACE;
    }
    if let Some(d) = ch.to_digit(10) {
        return DIGIT + d;
    }
    if ch.is_ascii_lowercase() {
        return letter(ch);
    }

    if language == Language::Sv {
        match ch {
            'å' => return LETTER + 26,
            'ä' | 'æ' => return LETTER + 27,
            'ö' | 'ø' => return LETTER + 28,
            'ü' => return letter('y'),
            _ => {}
        }
    }

    match ch {
        'á' | 'à' | 'â' | 'ã' | 'å' | 'ä' | 'æ' => letter('a'),
        'ç' => letter('c'),
        'é' | 'è' | 'ê' | 'ë' => letter('e'),
        'í' | 'ì' | 'î' | 'ï' => letter('i'),
        'ñ' => letter('n'),
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ø' => letter('o'),
        'ú' | 'ù' | 'û' | 'ü' => letter('u'),
        'ý' | 'ÿ' => letter('y'),
        c if c.is_ascii_punctuation() => PUNCT,
        c => OTHER + c as u32,
    }
}

fn letter(ch: char) -> u32 {
    LETTER + (ch as u32 - 'a' as u32)
}
