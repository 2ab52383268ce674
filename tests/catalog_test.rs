//! Catalog core tests
//!
//! Normalization, tab partition and search filter working together on
//! realistic catalog trees.

use mflix::catalog::{filter, normalize, normalize_tree, partition, Catalog, TabRule, TabRules};
use mflix::models::{MovieItem, PrimaryContent, TabId, PLACEHOLDER_POSTER, TAB_CONFIG};
use serde_json::{json, Value};

fn scenario_tree() -> Value {
    json!({
        "a1": {"title": "Blade Runner", "adult": false, "category": "movies"},
        "a2": {"title": "Attack on Titan", "adult": false, "category": "anime"},
        "a3": {"title": "Restricted X", "adult": true, "category": "movies"}
    })
}

fn mixed_items() -> Vec<MovieItem> {
    normalize_tree(&json!([
        {"title": "Blade Runner", "year": 1982, "genre": "Sci-Fi", "category": "movies", "language": "English"},
        {"title": "Breaking Bad", "year": "2008", "genre": "Crime, Drama", "category": "tvshow", "isSeries": true},
        {"title": "Attack on Titan", "genre": "Action", "category": "anime", "isSeries": true},
        {"title": "Restricted X", "category": "movies", "adult": true},
        {"title": "Runner Runner", "year": 2013, "qualityName": "720p", "category": "movies"},
        {"title": "Spirited Away", "genre": "Fantasy", "category": "anime", "language": "Japanese"},
        {"title": "Late Night", "category": "tvshow", "adult": "yes"}
    ]))
}

fn titles<'a>(items: impl IntoIterator<Item = &'a MovieItem>) -> Vec<&'a str> {
    items.into_iter().map(|i| i.title()).collect()
}

// =============================================================================
// Concrete Scenarios
// =============================================================================

#[test]
fn test_scenario_partition_and_filter() {
    let catalog = Catalog::from_tree(&scenario_tree());
    let rules = TabRules::default();

    let anime = partition(catalog.items(), TabId::Anime, &rules).unwrap();
    assert_eq!(titles(anime), vec!["Attack on Titan"]);

    let adult = partition(catalog.items(), TabId::Adult, &rules).unwrap();
    assert_eq!(titles(adult), vec!["Restricted X"]);

    let movies = partition(catalog.items(), TabId::Movies, &rules).unwrap();
    assert_eq!(titles(filter(movies, "blade")), vec!["Blade Runner"]);
}

#[test]
fn test_missing_poster_uses_placeholder() {
    let raw = json!({"title": "No Art"});
    let item = normalize("k", raw.as_object().unwrap());
    assert_eq!(item.poster, PLACEHOLDER_POSTER);

    let raw = json!({"title": "Blank Art", "poster": "   "});
    let item = normalize("k", raw.as_object().unwrap());
    assert_eq!(item.poster, PLACEHOLDER_POSTER);
}

// =============================================================================
// Search Properties
// =============================================================================

#[test]
fn test_empty_query_is_identity() {
    let items = mixed_items();
    for query in ["", "   ", "\t\n"] {
        let found = filter(&items, query);
        assert_eq!(found.len(), items.len());
        assert!(found.iter().zip(&items).all(|(a, b)| std::ptr::eq(*a, b)));
    }
}

#[test]
fn test_every_match_contains_needle() {
    let items = mixed_items();
    for query in ["runner", " BLADE ", "japanese", "2008", "720P", "drama", "zzz", "e"] {
        let needle = query.trim().to_lowercase();
        for item in filter(&items, query) {
            assert!(
                item.search_blob().contains(&needle),
                "{:?} matched {:?}",
                item.title(),
                query
            );
        }
    }
}

#[test]
fn test_search_matches_metadata_beyond_title() {
    let items = mixed_items();
    assert_eq!(titles(filter(&items, "sci-fi")), vec!["Blade Runner"]);
    assert_eq!(titles(filter(&items, "japanese")), vec!["Spirited Away"]);
    assert_eq!(titles(filter(&items, "2013")), vec!["Runner Runner"]);
}

#[test]
fn test_filter_keeps_source_order() {
    let items = mixed_items();
    let found = filter(&items, "runner");
    assert_eq!(titles(found), vec!["Blade Runner", "Runner Runner"]);
}

// =============================================================================
// Normalization Properties
// =============================================================================

#[test]
fn test_normalize_is_deterministic() {
    let raw = json!({
        "title": " Dune ", "year": 2021, "rating": 8.0, "adult": 0,
        "genre": ["Sci-Fi", "Adventure"],
        "links": [{"url": "https://a", "label": "1080p"}]
    });
    let record = raw.as_object().unwrap();
    assert_eq!(normalize("k", record), normalize("k", record));
}

#[test]
fn test_malformed_records_degrade_to_defaults() {
    let items = normalize_tree(&json!({
        "a": {"title": 42, "adult": "nope", "links": "not a list", "seasons": 7},
        "b": "not a record",
        "c": null
    }));
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.title(), "42");
    assert!(!item.adult);
    assert!(item.links.is_empty());
    assert!(item.seasons.is_empty());
}

#[test]
fn test_series_content_from_sparse_seasons() {
    let items = normalize_tree(&json!({"show": {
        "title": "Attack on Titan",
        "isSeries": true,
        "seasons": {
            "1": {"name": "Season 2", "episodes": [{"title": "Beast Titan", "url": "https://s2e1"}]},
            "0": {"name": "Season 1", "episodes": [
                {"title": "To You", "url": "https://s1e1"},
                {"title": "That Day", "url": "https://s1e2"}
            ]}
        }
    }}));
    let item = &items[0];
    assert_eq!(item.episode_count(), 3);
    match item.primary_content() {
        PrimaryContent::Seasons(seasons) => {
            assert_eq!(seasons[0].name, "Season 1");
            assert_eq!(seasons[1].name, "Season 2");
        }
        PrimaryContent::Links(_) => panic!("series should expose seasons"),
    }
}

// =============================================================================
// Partition Properties
// =============================================================================

#[test]
fn test_adult_split_is_exact() {
    let items = mixed_items();
    let rules = TabRules::default();

    let adult = partition(&items, TabId::Adult, &rules).unwrap();
    let home = partition(&items, TabId::Home, &rules).unwrap();

    assert!(adult.iter().all(|i| i.adult));
    assert!(home.iter().all(|i| !i.adult));
    assert_eq!(adult.len() + home.len(), items.len());
    for item in &items {
        let in_adult = adult.iter().any(|i| std::ptr::eq(*i, item));
        let in_home = home.iter().any(|i| std::ptr::eq(*i, item));
        assert!(in_adult ^ in_home, "{} must land on exactly one side", item.title());
    }
}

#[test]
fn test_category_tabs_are_disjoint_by_default() {
    let items = mixed_items();
    let rules = TabRules::default();
    let buckets = [TabId::Movies, TabId::TvShow, TabId::Anime, TabId::Adult];

    let mut seen: Vec<*const MovieItem> = Vec::new();
    for tab in buckets {
        for item in partition(&items, tab, &rules).unwrap() {
            let ptr = item as *const MovieItem;
            assert!(!seen.contains(&ptr), "{} is in two tabs", item.title());
            seen.push(ptr);
        }
    }
    assert_eq!(seen.len(), items.len());
}

#[test]
fn test_partition_keeps_source_order() {
    let items = mixed_items();
    let rules = TabRules::default();
    for tab in TAB_CONFIG.iter().map(|t| t.id) {
        let part = partition(&items, tab, &rules).unwrap();
        let positions: Vec<usize> = part
            .iter()
            .map(|p| items.iter().position(|i| std::ptr::eq(i, *p)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{} reordered", tab);
    }
}

#[test]
fn test_custom_rules_replace_bucket_policy() {
    let items = mixed_items();
    let rules = TabRules::default()
        .with_rule(
            TabId::Movies,
            TabRule {
                genres: vec!["sci-fi".into()],
                ..TabRule::default()
            },
        )
        .with(TabId::Anime, |item| item.meta().language == "Japanese");

    let movies = partition(&items, TabId::Movies, &rules).unwrap();
    assert_eq!(titles(movies), vec!["Blade Runner"]);
    let anime = partition(&items, TabId::Anime, &rules).unwrap();
    assert_eq!(titles(anime), vec!["Spirited Away"]);
}

#[test]
fn test_missing_rule_is_an_error() {
    let items = mixed_items();
    assert!(partition(&items, TabId::Movies, &TabRules::empty()).is_err());
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

#[test]
fn test_tab_counts_follow_tab_order() {
    let catalog = Catalog::from_items(mixed_items());
    let counts = catalog.tab_counts(&TabRules::default()).unwrap();

    let ids: Vec<TabId> = counts.iter().map(|c| c.id).collect();
    assert_eq!(
        ids,
        vec![TabId::Home, TabId::Movies, TabId::TvShow, TabId::Anime, TabId::Adult]
    );
    let count = |id| counts.iter().find(|c| c.id == id).unwrap().count;
    assert_eq!(count(TabId::Home), 5);
    assert_eq!(count(TabId::Movies), 2);
    assert_eq!(count(TabId::TvShow), 1);
    assert_eq!(count(TabId::Anime), 2);
    assert_eq!(count(TabId::Adult), 2);
}

#[test]
fn test_find_by_id_watch_key_or_store_key() {
    let catalog = Catalog::from_tree(&json!({
        "-Nx1": {"id": "blade runner", "title": "Blade Runner"}
    }));
    let item = &catalog.items()[0];

    assert_eq!(catalog.find("blade runner").map(|i| i.title()), Some("Blade Runner"));
    assert_eq!(catalog.find(&item.watch_key()).map(|i| i.title()), Some("Blade Runner"));
    assert_eq!(catalog.find("-Nx1").map(|i| i.title()), Some("Blade Runner"));
    assert!(catalog.find("nope").is_none());
}
