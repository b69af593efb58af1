//! Text canonicalization shared by indexing and querying.
//!
//! Both sides of a match must pass through [`normalize`] so that glyph
//! variants, diacritics, punctuation and case never cause a miss.

use once_cell::sync::Lazy;
use regex::Regex;

/// Farsi function words plus words every transcript in the corpus repeats.
pub const STOP_WORDS: &[&str] = &[
    "و", "در", "به", "از", "که", "را", "با", "این", "آن", "برای", "است", "هست", "شد", "شود",
    "می", "یا", "تا", "هم", "بر", "اگر", "اما", "یک", "چه", "چرا", "چطور", "کدام", "های",
    "هایش", "جلسه", "سخنرانی", "حاج", "آقا", "سعادتفر",
];

const ARABIC_YEH: char = '\u{064A}';
const FARSI_YEH: char = '\u{06CC}';
const ARABIC_KAF: char = '\u{0643}';
const FARSI_KAF: char = '\u{06A9}';

fn is_invisible_control(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}'
    )
}

fn is_arabic_diacritic(c: char) -> bool {
    ('\u{064B}'..='\u{065F}').contains(&c)
}

fn fold_glyph(c: char) -> char {
    match c {
        ARABIC_YEH => FARSI_YEH,
        ARABIC_KAF => FARSI_KAF,
        other => other,
    }
}

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid regex"));

/// Canonical matching form of `text`.
///
/// Zero-width and bidi controls become spaces, Arabic yeh/kaf fold to their
/// Farsi forms, harakat are dropped, anything that is not a letter, digit or
/// whitespace becomes a space, whitespace runs collapse and the result is
/// trimmed and lower-cased. Lower-casing happens before the character filter
/// so marks produced by case mapping are filtered too, which keeps the
/// function idempotent.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    for c in text.chars() {
        if is_invisible_control(c) {
            folded.push(' ');
            continue;
        }
        if is_arabic_diacritic(c) {
            continue;
        }
        folded.extend(fold_glyph(c).to_lowercase());
    }

    NON_WORD_RE
        .replace_all(&folded, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Normalized terms of `text` in order of appearance, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|token| token.chars().count() > 1 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Collapses whitespace and cuts to `max_chars` characters plus `...`.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let mut cut: String = cleaned.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// Like [`truncate_excerpt`] but the marker counts toward `max_chars`.
pub fn clip(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = cleaned.chars().take(keep).collect();
    cut.push_str(&"..."[..max_chars.min(3)]);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_arabic_yeh_and_lowercases_ascii() {
        assert_eq!(normalize("ABC ي"), "abc ی");
        assert_eq!(normalize("كتاب"), "کتاب");
    }

    #[test]
    fn strips_diacritics_controls_and_punctuation() {
        assert_eq!(normalize("مُحَمَّد"), "محمد");
        assert_eq!(normalize("می\u{200C}خواهم"), "می خواهم");
        assert_eq!(normalize("  سلام،   دنیا!  "), "سلام دنیا");
    }

    #[test]
    fn combining_marks_outside_harakat_split_words() {
        assert_eq!(normalize("الرحم\u{0670}ن"), "الرحم ن");
        assert_eq!(normalize("ا\u{0654}"), "ا");
        assert!(!normalize("رحمٰن").contains('\u{0670}'));
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "ABC ي",
            "İstanbul ΣΟΦΟΣ",
            "  متنِ\u{200F}آزمایشی؛ با  «علائم» ۱۲۳ ",
            "الرحم\u{0670}ن ﷲ",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn empty_input_normalizes_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_drops_stop_words_and_single_characters() {
        assert_eq!(tokenize("و این یک تست است"), vec!["تست".to_string()]);
    }

    #[test]
    fn tokenize_keeps_duplicates_in_order() {
        assert_eq!(
            tokenize("صبر و صبر، شکر"),
            vec!["صبر".to_string(), "صبر".to_string(), "شکر".to_string()]
        );
    }

    #[test]
    fn tokenize_drops_domain_words() {
        assert_eq!(tokenize("جلسه سخنرانی حاج آقا توحید"), vec!["توحید".to_string()]);
    }

    #[test]
    fn truncation_never_splits_characters() {
        let text = "سلام ".repeat(100);
        let cut = truncate_excerpt(&text, 7);
        assert_eq!(cut, "سلام سل...");
        assert_eq!(truncate_excerpt("  short   text ", 50), "short text");
    }

    #[test]
    fn clip_includes_marker_in_limit() {
        let clipped = clip(&"x".repeat(500), 220);
        assert_eq!(clipped.chars().count(), 220);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("ok", 220), "ok");
    }
}
