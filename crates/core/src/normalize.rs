use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::Locale;

/// A word with its byte span inside the tokenized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Lower-cases and strips diacritics so `Hà Nội` and `ha noi` compare equal.
/// Punctuation is kept, date patterns rely on it.
pub fn fold_text(input: &str) -> String {
    input
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if ch == 'đ' { 'd' } else { ch })
        .collect()
}

/// Lower-cases and composes (NFC) without touching diacritics, so `vé` and
/// `về` stay distinct.
pub fn lower_text(input: &str) -> String {
    input.to_lowercase().nfc().collect()
}

/// True when the text carries no diacritics at all, i.e. folding is a no-op
/// after lower-casing.
pub fn is_unaccented(input: &str) -> bool {
    let lowered = lower_text(input);
    fold_text(&lowered) == lowered
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for (offset, word) in text.unicode_word_indices() {
        // "tp.hcm" is a single word boundary-wise but two tokens for matching.
        let mut piece_start: Option<usize> = None;
        for (idx, ch) in word.char_indices() {
            match (ch.is_alphanumeric(), piece_start) {
                (true, None) => piece_start = Some(idx),
                (false, Some(start)) => {
                    tokens.push(token(text, offset + start, offset + idx));
                    piece_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = piece_start {
            tokens.push(token(text, offset + start, offset + word.len()));
        }
    }

    tokens
}

fn token(text: &str, start: usize, end: usize) -> Token<'_> {
    Token {
        text: &text[start..end],
        start,
        end,
    }
}

pub fn detect_locale(explicit: Option<Locale>, text: &str) -> Locale {
    if let Some(locale) = explicit {
        if locale != Locale::Unknown {
            return locale;
        }
    }

    let mut accented_count = 0usize;
    let mut latin_count = 0usize;

    for ch in text.chars() {
        let code = ch as u32;
        if ch.is_ascii_alphabetic() {
            latin_count += 1;
        } else if ch.is_alphabetic()
            && ((0x00C0..=0x024F).contains(&code) || (0x1E00..=0x1EFF).contains(&code))
        {
            accented_count += 1;
        }
    }

    if accented_count > 0 {
        return Locale::Vi;
    }

    if latin_count == 0 {
        return Locale::Unknown;
    }

    let folded = fold_text(text);
    if contains_any(
        &folded,
        &["chuyen bay", "ve may bay", "xin chao", "cam on", "tim ve", "dat ve"],
    ) {
        Locale::Vi
    } else {
        Locale::En
    }
}

pub(crate) fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
