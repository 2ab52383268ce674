//! Raw record normalization
//!
//! The only place that reads untyped source records. Every attribute has a
//! default, so a malformed record degrades to an emptier item instead of
//! failing.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::warn;

use crate::models::{Episode, MediaLink, Metadata, MovieItem, RawRecord, SearchField, Season};

/// Convert one raw record into a `MovieItem`
pub fn normalize(source_id: &str, raw: &RawRecord) -> MovieItem {
    let meta = Metadata {
        title: text(raw, SearchField::Title.raw_key()),
        rating: text(raw, "rating"),
        quality_name: text(raw, SearchField::QualityName.raw_key()),
        year: text(raw, SearchField::Year.raw_key()),
        language: text(raw, SearchField::Language.raw_key()),
        category: text(raw, SearchField::Category.raw_key()),
        genre: text(raw, SearchField::Genre.raw_key()),
        runtime: text(raw, "runtime"),
        cert: text(raw, SearchField::Cert.raw_key()),
        description: text(raw, "description"),
    };

    let id = text(raw, "id");
    let id = if id.is_empty() { source_id.to_string() } else { id };

    let mut item = MovieItem::new(id, source_id, meta);

    let poster = text(raw, "poster");
    if !poster.is_empty() {
        item.poster = poster;
    }
    item.adult = flag(raw, "adult");
    item.is_series = flag(raw, "isSeries");
    item.links = links(raw.get("links"));
    item.seasons = entries(raw.get("seasons"))
        .into_iter()
        .enumerate()
        .map(|(i, obj)| season(i, obj))
        .collect();
    item.raw = raw.clone();
    item
}

/// Normalize a collection node (object keyed by store key, or array)
pub fn normalize_tree(tree: &Value) -> Vec<MovieItem> {
    let keyed: Vec<(String, &Value)> = match tree {
        Value::Object(map) => {
            let mut keyed: Vec<(String, &Value)> =
                map.iter().map(|(k, v)| (k.clone(), v)).collect();
            keyed.sort_by(|(a, _), (b, _)| store_key_order(a, b));
            keyed
        }
        Value::Array(list) => list
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(kind = kind_of(other), "catalog root is not a collection, ignoring");
            Vec::new()
        }
    };

    keyed
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(record) => Some(normalize(&key, record)),
            Value::Null => None,
            other => {
                warn!(key = %key, kind = kind_of(other), "skipping non-record catalog entry");
                None
            }
        })
        .collect()
}

// =============================================================================
// Field Coercion
// =============================================================================

/// Read a field as display text. Numbers keep their decimal form,
/// arrays of scalars are comma-joined, anything else is empty.
fn text(raw: &RawRecord, key: &str) -> String {
    raw.get(key).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(list) => list
            .iter()
            .filter(|v| !v.is_array() && !v.is_object())
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn flag(raw: &RawRecord, key: &str) -> bool {
    match raw.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1")
        }
        _ => false,
    }
}

/// Key order of a stored collection: numeric keys numerically and ahead
/// of any other keys, which keep their string order.
fn store_key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Object entries of a sequence node.
///
/// Firebase returns sparse arrays as objects keyed "0", "1", ...
fn entries(value: Option<&Value>) -> Vec<&RawRecord> {
    match value {
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_object).collect(),
        Some(Value::Object(map)) => {
            let mut keyed: Vec<(&String, &Value)> = map.iter().collect();
            keyed.sort_by(|(a, _), (b, _)| store_key_order(a, b));
            keyed.into_iter().filter_map(|(_, v)| v.as_object()).collect()
        }
        _ => Vec::new(),
    }
}

/// First non-empty text among `keys`
fn first_text(raw: &RawRecord, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| text(raw, k))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn optional_text(raw: &RawRecord, key: &str) -> Option<String> {
    Some(text(raw, key)).filter(|s| !s.is_empty())
}

fn links(value: Option<&Value>) -> Vec<MediaLink> {
    entries(value)
        .into_iter()
        .filter_map(media_link)
        .enumerate()
        .map(|(i, mut link)| {
            if link.label.is_empty() {
                link.label = link
                    .server
                    .clone()
                    .unwrap_or_else(|| format!("Link {}", i + 1));
            }
            link
        })
        .collect()
}

fn media_link(raw: &RawRecord) -> Option<MediaLink> {
    let url = first_text(raw, &["url", "link"]);
    if url.is_empty() {
        return None;
    }
    Some(MediaLink {
        url,
        label: first_text(raw, &["label", "name", "quality"]),
        server: optional_text(raw, "server"),
        info: optional_text(raw, "info"),
    })
}

fn season(index: usize, raw: &RawRecord) -> Season {
    let name = first_text(raw, &["name", "title"]);
    Season {
        name: if name.is_empty() {
            format!("Season {}", index + 1)
        } else {
            name
        },
        episodes: entries(raw.get("episodes"))
            .into_iter()
            .enumerate()
            .map(|(i, obj)| episode(i, obj))
            .collect(),
    }
}

fn episode(index: usize, raw: &RawRecord) -> Episode {
    let title = first_text(raw, &["title", "name"]);
    Episode {
        title: if title.is_empty() {
            format!("Episode {}", index + 1)
        } else {
            title
        },
        url: first_text(raw, &["url", "link"]),
        links: links(raw.get("links")),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER_POSTER;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_full_movie_record() {
        let raw = record(json!({
            "id": "blade-runner",
            "title": "  Blade Runner ",
            "poster": "https://img.example/br.jpg",
            "rating": 8.1,
            "qualityName": "1080p",
            "year": 1982,
            "language": "English",
            "category": "movies",
            "genre": ["Sci-Fi", "Noir"],
            "runtime": "117 min",
            "cert": "R",
            "description": "A blade runner must pursue replicants.",
            "adult": false,
            "links": [
                {"url": "https://cdn.example/br-1080.mp4", "label": "1080p", "server": "Drive"},
                {"url": "https://cdn.example/br-720.mp4", "name": "720p", "info": "x264"}
            ]
        }));

        let item = normalize("-Nabc", &raw);
        assert_eq!(item.id, "blade-runner");
        assert_eq!(item.source_id, "-Nabc");
        assert_eq!(item.title(), "Blade Runner");
        assert_eq!(item.poster, "https://img.example/br.jpg");
        assert_eq!(item.meta().rating, "8.1");
        assert_eq!(item.meta().year, "1982");
        assert_eq!(item.meta().genre, "Sci-Fi, Noir");
        assert!(!item.adult);
        assert!(!item.is_series);
        assert_eq!(item.links.len(), 2);
        assert_eq!(item.links[0].server.as_deref(), Some("Drive"));
        assert_eq!(item.links[1].label, "720p");
        assert_eq!(item.links[1].info.as_deref(), Some("x264"));
        assert_eq!(item.raw, raw);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let item = normalize("k1", &RawRecord::new());
        assert_eq!(item.id, "k1");
        assert_eq!(item.poster, PLACEHOLDER_POSTER);
        assert_eq!(item.title(), "");
        assert!(!item.adult);
        assert!(!item.is_series);
        assert!(item.links.is_empty());
        assert!(item.seasons.is_empty());
        assert_eq!(item.search_blob().trim(), "");
    }

    #[test]
    fn test_malformed_fields_use_defaults() {
        let raw = record(json!({
            "title": {"nested": true},
            "poster": "   ",
            "adult": "maybe",
            "isSeries": [],
            "links": "not a list",
            "seasons": 42
        }));
        let item = normalize("k", &raw);
        assert_eq!(item.title(), "");
        assert_eq!(item.poster, PLACEHOLDER_POSTER);
        assert!(!item.adult);
        assert!(!item.is_series);
        assert!(item.links.is_empty());
        assert!(item.seasons.is_empty());
    }

    #[test]
    fn test_flag_coercion() {
        for (value, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!(0), false),
            (json!("Yes"), true),
            (json!("1"), true),
            (json!("false"), false),
            (json!(null), false),
        ] {
            let raw = record(json!({ "adult": value }));
            assert_eq!(normalize("k", &raw).adult, expected, "adult = {}", value);
        }
    }

    #[test]
    fn test_series_with_firebase_sparse_arrays() {
        let raw = record(json!({
            "title": "Attack on Titan",
            "isSeries": true,
            "seasons": {
                "1": {"name": "Season 2", "episodes": [{"title": "Beast Titan", "url": "https://cdn.example/s2e1"}]},
                "0": {
                    "episodes": {
                        "10": {"title": "E11", "url": "https://cdn.example/s1e11"},
                        "2": {"url": "https://cdn.example/s1e3", "links": {
                            "0": {"url": "https://m1.example/s1e3", "label": "Mirror 1"},
                            "1": {"label": "broken"},
                            "2": {"link": "https://m2.example/s1e3", "server": "Mega"}
                        }}
                    }
                }
            }
        }));

        let item = normalize("aot", &raw);
        assert!(item.is_series);
        assert_eq!(item.seasons.len(), 2);

        let s1 = &item.seasons[0];
        assert_eq!(s1.name, "Season 1");
        assert_eq!(s1.episodes.len(), 2);
        assert_eq!(s1.episodes[0].title, "Episode 1");
        assert_eq!(s1.episodes[0].url, "https://cdn.example/s1e3");
        assert_eq!(s1.episodes[0].links.len(), 2);
        assert_eq!(s1.episodes[0].links[1].label, "Mega");
        assert_eq!(s1.episodes[1].title, "E11");

        assert_eq!(item.seasons[1].name, "Season 2");
        assert_eq!(item.seasons[1].episodes[0].title, "Beast Titan");
        assert_eq!(item.episode_count(), 3);
    }

    #[test]
    fn test_link_label_fallback() {
        let raw = record(json!({
            "links": [{"url": "https://a"}, {"url": "https://b", "server": "Drive"}]
        }));
        let item = normalize("k", &raw);
        assert_eq!(item.links[0].label, "Link 1");
        assert_eq!(item.links[1].label, "Drive");
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = record(json!({"title": "Alien", "year": "1979", "links": [{"url": "u"}]}));
        assert_eq!(normalize("k", &raw), normalize("k", &raw));
    }

    #[test]
    fn test_normalize_tree_orders_numeric_keys_numerically() {
        let tree = json!({
            "10": {"title": "C"},
            "2": {"title": "B"},
            "1": {"title": "A"},
            "-Nb": {"title": "E"},
            "-Na": {"title": "D"}
        });
        let titles: Vec<String> = normalize_tree(&tree)
            .iter()
            .map(|item| item.title().to_string())
            .collect();
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_normalize_tree_object_and_array() {
        let tree = json!({
            "b": {"title": "Second"},
            "a": {"title": "First"},
            "c": "junk",
            "d": null
        });
        let items = normalize_tree(&tree);
        let titles: Vec<_> = items.iter().map(|i| i.title()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(items[0].source_id, "a");

        let tree = json!([{"title": "Zero"}, null, {"title": "Two"}]);
        let items = normalize_tree(&tree);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source_id, "2");

        assert!(normalize_tree(&Value::Null).is_empty());
        assert!(normalize_tree(&json!("scalar")).is_empty());
    }
}
