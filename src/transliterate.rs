//! Phonetic transliteration used to widen fuzzy matching.
//!
//! Han characters become their tone-less pinyin so that typing `zhongwen`
//! matches a note called `中文`. Everything else is copied through.

use pinyin::ToPinyin;

/// Transliterate `text` into ASCII pinyin, one syllable per Han character,
/// concatenated in place.
///
/// `ü` is spelled `v`, as pinyin input methods do, so `绿` becomes `lv`.
pub fn convert_to_pinyin(text: &str) -> String {
    let mut converted = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch.to_pinyin() {
            Some(syllable) => converted.push_str(&syllable.plain().replace('ü', "v")),
            None => converted.push(ch),
        }
    }

    converted
}

/// Filter text that matches both the original script and its transliteration.
pub fn with_pinyin(text: &str) -> String {
    format!("{} {}", text, convert_to_pinyin(text))
}
