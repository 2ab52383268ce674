//! MFLIX - terminal browser for a realtime movie and series catalog
//!
//! Pulls the catalog tree from a realtime database (or a JSON export),
//! splits it into tabs, filters it by a search query and hands links
//! to a local player.
//!
//! # Modules
//!
//! - `models` - Catalog items, tabs, searchable metadata
//! - `catalog` - Normalization, tab partition, search filter
//! - `api` - Realtime database client and live event stream
//! - `source` - Remote or on-disk catalog sources
//! - `config` - Config file and environment
//! - `player` - Local VLC/mpv playback
//! - `cli` / `commands` - Scriptable subcommands
//! - `ui` / `app` - Interactive TUI

pub mod api;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod player;
pub mod source;
pub mod ui;

// Re-export commonly used types
pub use models::{
    Episode, MediaLink, Metadata, MovieItem, PrimaryContent, SearchField, Season, TabId,
    SEARCH_FIELDS, TAB_CONFIG,
};

pub use api::{FirebaseClient, LiveTree, TreeEvent};
pub use app::{App, AppState};
pub use catalog::{Catalog, CatalogError, TabRules};
pub use config::Config;
pub use source::{CatalogSource, SourceError};
