use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text for keyword matching: lowercase, strip diacritics, and collapse whitespace.
///
/// - "Protección" → "proteccion"
/// - "  Económico   PREMIUM " → "economico premium"
///
/// NFD decomposition splits accented letters into base + combining mark, and
/// the marks are dropped. Punctuation is kept so keywords such as "24/7" survive.
pub fn normalize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split normalized text into distinct words of at least `min_len` characters,
/// keeping first-occurrence order.
pub fn query_words(normalized: &str, min_len: usize) -> Vec<&str> {
    let mut words: Vec<&str> = Vec::new();
    for word in normalized.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() >= min_len && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}
