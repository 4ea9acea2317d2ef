// crates/geoloc-core/src/text.rs

//! # Text helpers
//!
//! Canonical forms for municipality names and region codes, plus the
//! accent-insensitive folding used by the in-memory text index.

/// Minimum word length (in characters) that gets capitalised.
const CAPITALIZE_MIN_CHARS: usize = 3;

/// Normalizes a municipality name for storage and lookup.
///
/// The input is split on the literal space character. Every word with at
/// least three characters is lowercased and then gets its first character
/// uppercased; shorter words ("de", "do", "da") are left untouched. Words are
/// rejoined with single spaces, so the number of words never changes.
///
/// Lengths are measured in `char`s, not bytes, so `"são"` counts as three.
///
/// # Examples
///
/// ```rust
/// use geoloc_core::text::normalize_municipio;
///
/// assert_eq!(normalize_municipio("RIO DE JANEIRO"), "Rio DE Janeiro");
/// assert_eq!(normalize_municipio("rio de janeiro"), "Rio de Janeiro");
/// assert_eq!(normalize_municipio("são paulo"), "São Paulo");
/// assert_eq!(normalize_municipio(""), "");
/// ```
pub fn normalize_municipio(raw: &str) -> String {
    raw.split(' ')
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    if word.chars().count() < CAPITALIZE_MIN_CHARS {
        return word.to_owned();
    }

    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => lower,
    }
}

/// Canonical form of a region (state) code: trimmed and uppercased.
///
/// ```rust
/// use geoloc_core::text::normalize_region;
///
/// assert_eq!(normalize_region(" sp "), "SP");
/// ```
pub fn normalize_region(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Convert a string into a folded key suitable for indexing and comparison.
///
/// Transliterates Unicode to ASCII with `deunicode` and lowercases the
/// result, so `"Brasília"` and `"brasilia"` fold to the same key.
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

/// Splits a folded string into alphanumeric search terms.
pub fn fold_terms(s: &str) -> Vec<String> {
    fold_key(s)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}
