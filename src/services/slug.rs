//! URL slug derivation

use crate::models::MAX_SLUG_CHARS;

/// Derive a slug from a title.
///
/// Lowercases, keeps ASCII alphanumerics and non-ASCII letters/digits, and
/// collapses every other run of characters into a single hyphen.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::new();
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        let keep = c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric());
        if keep {
            if pending_hyphen && !result.is_empty() {
                result.push('-');
            }
            pending_hyphen = false;
            result.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    match result.char_indices().nth(MAX_SLUG_CHARS) {
        Some((idx, _)) => result[..idx].trim_end_matches('-').to_string(),
        None => result,
    }
}

/// `base`, then `base-2`, `base-3`, ... for the given attempt (0-based)
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt + 1)
    }
}
