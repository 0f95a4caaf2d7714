//! Text normalization shared by search and suggestions
//!
//! Free-text search terms are transliterated to ASCII, lower-cased and
//! stripped of punctuation before being matched.
//! Tags and author names are compared case-insensitively after trimming.

use std::collections::BTreeSet;

/// Characters removed from free-text queries before splitting into terms.
pub const STRIPPED_PUNCTUATION: &[char] = &[
    ',', '.', '"', ':', '\'', '(', ')', '[', ']', '^', ';', '!', '¡', '¿', '?',
];

/// Split a free-text query into normalized search terms.
///
/// ```
/// use hub_common::text::search_terms;
///
/// assert_eq!(search_terms("Pokémon: (Red) Edition!"), vec!["pokemon", "red", "edition"]);
/// ```
pub fn search_terms(query: &str) -> Vec<String> {
    let folded: String = deunicode::deunicode(query)
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase();

    folded.split_whitespace().map(str::to_string).collect()
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
/// Case is preserved.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim and lower-case values, dropping empty ones and duplicates.
pub fn normalize_values<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flatten()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Normalize a comma-separated tag string into a set of lower-case tags.
pub fn normalize_tags(tags: Option<&str>) -> BTreeSet<String> {
    match tags {
        Some(tags) => normalize_values(tags.split(',').map(Some)),
        None => BTreeSet::new(),
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build a `%value%` substring pattern with LIKE wildcards escaped.
pub fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}
