//! Data structures and types for MFLIX
//!
//! Contains the shared catalog models organized by domain:
//! - **Catalog**: `MovieItem` and its searchable metadata
//! - **Playback**: media links, seasons and episodes
//! - **Navigation**: tab identifiers and the fixed tab/search tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::CatalogError;

/// Untyped source record exactly as it arrived from the data source
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Poster shown for records that carry no artwork
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/300x450?text=MFLIX";

// =============================================================================
// Tabs
// =============================================================================

/// Catalog tab (display bucket)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabId {
    #[default]
    Home,
    Movies,
    TvShow,
    Anime,
    Adult,
}

impl TabId {
    /// Wire/config name of the tab
    pub fn as_str(&self) -> &'static str {
        match self {
            TabId::Home => "home",
            TabId::Movies => "movies",
            TabId::TvShow => "tvshow",
            TabId::Anime => "anime",
            TabId::Adult => "adult",
        }
    }

    /// Human readable label from `TAB_CONFIG`
    pub fn label(&self) -> &'static str {
        TAB_CONFIG
            .iter()
            .find(|t| t.id == *self)
            .map(|t| t.label)
            .unwrap_or("")
    }

    /// Position of the tab in `TAB_CONFIG`
    pub fn index(&self) -> usize {
        TAB_CONFIG.iter().position(|t| t.id == *self).unwrap_or(0)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TAB_CONFIG
            .iter()
            .find(|t| t.id.as_str() == wanted)
            .map(|t| t.id)
            .ok_or_else(|| CatalogError::UnknownTab(s.to_string()))
    }
}

/// One entry of the tab bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabConfig {
    pub id: TabId,
    pub label: &'static str,
}

/// Tabs in display order
pub const TAB_CONFIG: &[TabConfig] = &[
    TabConfig { id: TabId::Home, label: "Home" },
    TabConfig { id: TabId::Movies, label: "Movies" },
    TabConfig { id: TabId::TvShow, label: "TV Shows" },
    TabConfig { id: TabId::Anime, label: "Anime" },
    TabConfig { id: TabId::Adult, label: "18+" },
];

// =============================================================================
// Searchable Metadata
// =============================================================================

/// Metadata fields that feed the search blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Genre,
    Category,
    Language,
    Year,
    QualityName,
    Cert,
}

impl SearchField {
    /// Key of the field in a raw record
    pub fn raw_key(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Genre => "genre",
            SearchField::Category => "category",
            SearchField::Language => "language",
            SearchField::Year => "year",
            SearchField::QualityName => "qualityName",
            SearchField::Cert => "cert",
        }
    }

    /// Read the field from normalized metadata
    pub fn value<'a>(&self, meta: &'a Metadata) -> &'a str {
        match self {
            SearchField::Title => &meta.title,
            SearchField::Genre => &meta.genre,
            SearchField::Category => &meta.category,
            SearchField::Language => &meta.language,
            SearchField::Year => &meta.year,
            SearchField::QualityName => &meta.quality_name,
            SearchField::Cert => &meta.cert,
        }
    }
}

/// Fields concatenated (in this order) into `MovieItem::search_blob`
pub const SEARCH_FIELDS: &[SearchField] = &[
    SearchField::Title,
    SearchField::Genre,
    SearchField::Category,
    SearchField::Language,
    SearchField::Year,
    SearchField::QualityName,
    SearchField::Cert,
];

/// Display metadata of a catalog entry. All values are opaque text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub rating: String,
    pub quality_name: String,
    pub year: String,
    pub language: String,
    pub category: String,
    pub genre: String,
    pub runtime: String,
    pub cert: String,
    pub description: String,
}

impl Metadata {
    /// Lower-cased, space-joined `SEARCH_FIELDS` values
    pub fn search_blob(&self) -> String {
        SEARCH_FIELDS
            .iter()
            .map(|f| f.value(self))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// One playable source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLink {
    pub url: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl fmt::Display for MediaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if let Some(server) = &self.server {
            write!(f, " [{}]", server)?;
        }
        if let Some(info) = &self.info {
            write!(f, " - {}", info)?;
        }
        Ok(())
    }
}

/// Episode of a series, possibly mirrored across several links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub url: String,
    pub links: Vec<MediaLink>,
}

impl Episode {
    /// Links to offer for playback; falls back to the canonical url
    pub fn playable_links(&self) -> Vec<MediaLink> {
        if !self.links.is_empty() {
            return self.links.clone();
        }
        if self.url.is_empty() {
            return Vec::new();
        }
        vec![MediaLink {
            url: self.url.clone(),
            label: self.title.clone(),
            server: None,
            info: None,
        }]
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} links)", self.title, self.links.len())
    }
}

/// Season of a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub name: String,
    pub episodes: Vec<Episode>,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} episodes)", self.name, self.episodes.len())
    }
}

/// Navigable content of an item, chosen by `is_series`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryContent<'a> {
    Links(&'a [MediaLink]),
    Seasons(&'a [Season]),
}

// =============================================================================
// Catalog Entry
// =============================================================================

/// Normalized catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieItem {
    pub id: String,
    pub source_id: String,
    pub poster: String,
    #[serde(flatten)]
    meta: Metadata,
    pub adult: bool,
    pub is_series: bool,
    pub links: Vec<MediaLink>,
    pub seasons: Vec<Season>,
    #[serde(skip)]
    search_blob: String,
    pub raw: RawRecord,
}

impl MovieItem {
    /// Build an item; the search blob is derived from `meta`
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, meta: Metadata) -> Self {
        let search_blob = meta.search_blob();
        Self {
            id: id.into(),
            source_id: source_id.into(),
            poster: PLACEHOLDER_POSTER.to_string(),
            meta,
            adult: false,
            is_series: false,
            links: Vec::new(),
            seasons: Vec::new(),
            search_blob,
            raw: RawRecord::new(),
        }
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn search_blob(&self) -> &str {
        &self.search_blob
    }

    /// Replace the metadata, recomputing the search blob
    pub fn with_metadata(mut self, meta: Metadata) -> Self {
        self.search_blob = meta.search_blob();
        self.meta = meta;
        self
    }

    /// Links for movies, season tree for series
    pub fn primary_content(&self) -> PrimaryContent<'_> {
        if self.is_series {
            PrimaryContent::Seasons(&self.seasons)
        } else {
            PrimaryContent::Links(&self.links)
        }
    }

    /// URL-safe key for the watch view
    pub fn watch_key(&self) -> String {
        urlencoding::encode(&self.id).into_owned()
    }

    /// Total episode count across seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

impl fmt::Display for MovieItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta.title)?;
        if !self.meta.year.is_empty() {
            write!(f, " ({})", self.meta.year)?;
        }
        if self.is_series {
            write!(f, " [{} seasons]", self.seasons.len())
        } else if !self.meta.quality_name.is_empty() {
            write!(f, " [{}]", self.meta.quality_name)
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
