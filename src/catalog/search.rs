//! Free-text filter over precomputed search blobs

use crate::models::MovieItem;

/// Trimmed, lower-cased needle, or `None` for a blank query
pub fn normalize_query(query: &str) -> Option<String> {
    let needle = query.trim();
    if needle.is_empty() {
        None
    } else {
        Some(needle.to_lowercase())
    }
}

/// Items whose search blob contains `query`, in input order.
///
/// A blank query returns every item. Matching is plain substring containment
/// after lower-casing; no tokenizing, ranking or accent folding.
pub fn filter<'a, I>(items: I, query: &str) -> Vec<&'a MovieItem>
where
    I: IntoIterator<Item = &'a MovieItem>,
{
    match normalize_query(query) {
        None => items.into_iter().collect(),
        Some(needle) => items
            .into_iter()
            .filter(|item| item.search_blob().contains(needle.as_str()))
            .collect(),
    }
}
