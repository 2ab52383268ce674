//! Tab partition
//!
//! Buckets catalog items per tab. Bucket policy lives in a `TabRules` table
//! of predicates, so it can be swapped (config file, tests, callers) without
//! touching `partition`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::models::{MovieItem, TabId, TAB_CONFIG};

/// Membership test for one tab
pub type TabPredicate = Box<dyn Fn(&MovieItem) -> bool + Send + Sync>;

// =============================================================================
// Data Rules
// =============================================================================

/// Declarative bucket rule, as written in the config file.
///
/// An item matches when its category equals one of `categories` or one of
/// its genres equals one of `genres` (case-insensitive). A rule with neither
/// list matches everything. `series` additionally pins `is_series`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<bool>,
}

impl TabRule {
    /// Rule matching any item
    pub fn any() -> Self {
        Self::default()
    }

    /// Rule matching the given category aliases
    pub fn categories<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: aliases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &MovieItem) -> bool {
        if let Some(series) = self.series {
            if item.is_series != series {
                return false;
            }
        }
        if self.categories.is_empty() && self.genres.is_empty() {
            return true;
        }

        let category = item.meta().category.trim().to_lowercase();
        let category_hit = self
            .categories
            .iter()
            .any(|c| c.trim().to_lowercase() == category);

        category_hit
            || item
                .meta()
                .genre
                .split([',', '/', '|', ';'])
                .map(|g| g.trim().to_lowercase())
                .filter(|g| !g.is_empty())
                .any(|g| self.genres.iter().any(|r| r.trim().to_lowercase() == g))
    }
}

/// Per-tab rules, one field per tab (`[tabs.<id>]` in config.toml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabRulesConfig {
    pub home: TabRule,
    pub movies: TabRule,
    pub tvshow: TabRule,
    pub anime: TabRule,
    pub adult: TabRule,
}

impl Default for TabRulesConfig {
    fn default() -> Self {
        Self {
            home: TabRule::any(),
            movies: TabRule::categories(["movies", "movie", "film", "films"]),
            tvshow: TabRule::categories([
                "tvshow",
                "tv show",
                "tv shows",
                "tv",
                "series",
                "web series",
            ]),
            anime: TabRule::categories(["anime"]),
            adult: TabRule::any(),
        }
    }
}

impl TabRulesConfig {
    pub fn rule(&self, tab: TabId) -> &TabRule {
        match tab {
            TabId::Home => &self.home,
            TabId::Movies => &self.movies,
            TabId::TvShow => &self.tvshow,
            TabId::Anime => &self.anime,
            TabId::Adult => &self.adult,
        }
    }
}

// =============================================================================
// Predicate Table
// =============================================================================

/// Predicate-per-tab table consumed by `partition`
pub struct TabRules {
    predicates: HashMap<TabId, TabPredicate>,
}

impl TabRules {
    /// Table without any predicate
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Compile declarative rules into predicates
    pub fn from_config(config: &TabRulesConfig) -> Self {
        TAB_CONFIG.iter().fold(Self::empty(), |rules, tab| {
            rules.with_rule(tab.id, config.rule(tab.id).clone())
        })
    }

    /// Install (or replace) the predicate of a tab
    pub fn with<F>(mut self, tab: TabId, predicate: F) -> Self
    where
        F: Fn(&MovieItem) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(tab, Box::new(predicate));
        self
    }

    /// Install a declarative rule for a tab
    pub fn with_rule(self, tab: TabId, rule: TabRule) -> Self {
        self.with(tab, move |item| rule.matches(item))
    }

    pub fn predicate(&self, tab: TabId) -> Option<&TabPredicate> {
        self.predicates.get(&tab)
    }
}

impl Default for TabRules {
    fn default() -> Self {
        Self::from_config(&TabRulesConfig::default())
    }
}

impl fmt::Debug for TabRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tabs: Vec<TabId> = TAB_CONFIG
            .iter()
            .map(|t| t.id)
            .filter(|id| self.predicates.contains_key(id))
            .collect();
        f.debug_struct("TabRules").field("tabs", &tabs).finish()
    }
}

// =============================================================================
// Partition
// =============================================================================

/// Items belonging to `tab`, in input order.
///
/// The adult flag is applied before the tab predicate: the adult tab only
/// ever sees adult items and every other tab only non-adult ones.
pub fn partition<'a, I>(
    items: I,
    tab: TabId,
    rules: &TabRules,
) -> Result<Vec<&'a MovieItem>, CatalogError>
where
    I: IntoIterator<Item = &'a MovieItem>,
{
    let predicate = rules
        .predicate(tab)
        .ok_or(CatalogError::MissingRule(tab))?;
    let want_adult = tab == TabId::Adult;

    Ok(items
        .into_iter()
        .filter(|item| item.adult == want_adult && predicate(*item))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================
