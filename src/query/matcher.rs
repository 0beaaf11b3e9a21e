//! Field matchers: pure predicates over a field value and a filter value.
//!
//! Three shapes:
//! - [`exact_match`]: byte equality (`type`, `status`, `purl`).
//! - [`contains_match`]: case-insensitive substring.
//! - [`phrase_match`]: case-insensitive equality with the whole value.
//!
//! An empty filter value is unconstrained and matches everything, including
//! records where the field is unset. A non-empty filter never matches an
//! unset field.

/// Byte-exact equality.
pub fn exact_match(field: &str, value: &str) -> bool {
    value.is_empty() || field == value
}

/// Case-insensitive substring test.
pub fn contains_match(field: &str, value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    field.to_lowercase().contains(&value.to_lowercase())
}

/// Case-insensitive equality with the entire field value.
pub fn phrase_match(field: &str, value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    field.to_lowercase() == value.to_lowercase()
}

/// Case-insensitive substring test against a whole-record text view.
///
/// `view` must already be lowercased (see `IndexedRecord::text_view`).
pub fn phrase_in_view(view: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return true;
    }
    view.contains(&phrase.to_lowercase())
}

/// [`exact_match`] against an optional field.
pub fn exact_opt(field: Option<&str>, value: &str) -> bool {
    match field {
        Some(f) => exact_match(f, value),
        None => value.is_empty(),
    }
}

/// [`contains_match`] against an optional field.
pub fn contains_opt(field: Option<&str>, value: &str) -> bool {
    match field {
        Some(f) => contains_match(f, value),
        None => value.is_empty(),
    }
}

/// [`phrase_match`] against an optional field.
pub fn phrase_opt(field: Option<&str>, value: &str) -> bool {
    match field {
        Some(f) => phrase_match(f, value),
        None => value.is_empty(),
    }
}

/// True if any element contains `value`.
pub fn contains_any<S: AsRef<str>>(elements: &[S], value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let needle = value.to_lowercase();
    elements
        .iter()
        .any(|e| e.as_ref().to_lowercase().contains(&needle))
}

/// True if one full element equals `value`, ignoring case.
pub fn phrase_any<S: AsRef<str>>(elements: &[S], value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let needle = value.to_lowercase();
    elements.iter().any(|e| e.as_ref().to_lowercase() == needle)
}
