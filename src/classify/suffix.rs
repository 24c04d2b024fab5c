// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Variation-suffix stripping and display casing

/// Split trailing variation markers off an underscore-joined name.
///
/// Repeatedly removes a trailing number (`_01`), a bare alt marker
/// (`_alt`) or a numbered alt marker (`_alt01`), which covers the
/// `_alt_<N>`, `_<N>_alt` and `_<N>` layouts in any combination. The first
/// token is never removed. Returns the base and the removed suffix.
pub fn split_variation(raw: &str) -> (&str, Option<&str>) {
    let mut end = raw.len();

    while let Some(idx) = raw[..end].rfind('_') {
        if idx == 0 || !is_variation_token(&raw[idx + 1..end]) {
            break;
        }
        end = idx;
    }

    let suffix = raw[end..].trim_start_matches('_');
    let suffix = if suffix.is_empty() { None } else { Some(suffix) };
    (&raw[..end], suffix)
}

/// Base name with every trailing variation marker removed
pub fn strip_variation(raw: &str) -> &str {
    split_variation(raw).0
}

/// Whether every token of `raw` is a variation marker
pub fn is_variation_only(raw: &str) -> bool {
    !raw.is_empty() && raw.split('_').all(is_variation_token)
}

fn is_variation_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    match token.strip_prefix("alt") {
        Some(rest) => rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Underscores to spaces, surrounding whitespace trimmed
pub fn humanize(raw: &str) -> String {
    raw.split('_')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sentence case: first character upper, the rest lower
pub fn sentence_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
