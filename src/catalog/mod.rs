//! Catalog core
//!
//! - `normalize`: raw records → `MovieItem`
//! - `tabs`: tab partition with injectable bucket rules
//! - `search`: substring filter over search blobs
//!
//! `Catalog` is an immutable snapshot. Updates build a new one.

pub mod normalize;
pub mod search;
pub mod tabs;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{MovieItem, TabId, TAB_CONFIG};

pub use normalize::{normalize, normalize_tree};
pub use search::filter;
pub use tabs::{partition, TabPredicate, TabRule, TabRules, TabRulesConfig};

/// Catalog error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown tab '{0}' (expected one of: home, movies, tvshow, anime, adult)")]
    UnknownTab(String),

    #[error("No bucket rule configured for tab '{0}'")]
    MissingRule(TabId),
}

/// Item count of one tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabCount {
    pub id: TabId,
    pub label: &'static str,
    pub count: usize,
}

/// Normalized catalog snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    items: Vec<MovieItem>,
}

impl Catalog {
    /// Build from a collection node of the data source
    pub fn from_tree(tree: &Value) -> Self {
        Self::from_items(normalize_tree(tree))
    }

    pub fn from_items(items: Vec<MovieItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[MovieItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of `tab` matching `query`: partition first, then filter
    pub fn view(
        &self,
        tab: TabId,
        query: &str,
        rules: &TabRules,
    ) -> Result<Vec<&MovieItem>, CatalogError> {
        Ok(filter(partition(&self.items, tab, rules)?, query))
    }

    /// Resolve a watch key: display id, decoded watch key, or store key
    pub fn find(&self, key: &str) -> Option<&MovieItem> {
        let decoded = urlencoding::decode(key)
            .map(|k| k.into_owned())
            .unwrap_or_else(|_| key.to_string());

        self.items
            .iter()
            .find(|i| i.id == key || i.id == decoded)
            .or_else(|| self.items.iter().find(|i| i.source_id == key))
    }

    /// Per-tab counts in `TAB_CONFIG` order
    pub fn tab_counts(&self, rules: &TabRules) -> Result<Vec<TabCount>, CatalogError> {
        TAB_CONFIG
            .iter()
            .map(|tab| {
                Ok(TabCount {
                    id: tab.id,
                    label: tab.label,
                    count: partition(&self.items, tab.id, rules)?.len(),
                })
            })
            .collect()
    }
}
