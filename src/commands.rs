//! CLI Command Handlers
//!
//! Implements all CLI commands on top of the catalog core.
//! Each handler takes CLI args, the shared context and Output, returns ExitCode.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, TabRules};
use crate::cli::{
    ConfigCmd, ExitCode, InfoCmd, ItemSummary, LinksCmd, LinksResponse, ListCmd, ListResponse,
    Output, SearchCmd, WatchCmd, WatchResponse,
};
use crate::config::Config;
use crate::models::{MediaLink, MovieItem, TabId};
use crate::player::{LocalPlayer, PlayerType};
use crate::source::{CatalogSource, SourceError};

// =============================================================================
// Context
// =============================================================================

/// Settings shared by all handlers
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub source_override: Option<String>,
}

impl Context {
    pub fn new(config: Config, config_path: Option<PathBuf>, source_override: Option<String>) -> Self {
        Self {
            config,
            config_path,
            source_override,
        }
    }

    pub fn source(&self) -> Result<CatalogSource, SourceError> {
        self.config
            .source(self.source_override.as_deref())
            .ok_or(SourceError::NotConfigured)
    }

    pub async fn catalog(&self) -> Result<Catalog, SourceError> {
        self.source()?.catalog().await
    }

    pub fn rules(&self) -> TabRules {
        self.config.tab_rules()
    }
}

/// Load the catalog or report the failure
async fn load_catalog(ctx: &Context, output: &Output) -> Result<Catalog, ExitCode> {
    let source = ctx.source().map_err(|e| output.error(e.to_string(), ExitCode::InvalidArgs))?;
    output.info(format!("Loading catalog from {}...", source));
    source
        .catalog()
        .await
        .map_err(|e| output.error(format!("Catalog load failed: {}", e), ExitCode::SourceError))
}

fn parse_tab(tab: &str, output: &Output) -> Result<TabId, ExitCode> {
    TabId::from_str(tab).map_err(|e| output.error(e.to_string(), ExitCode::InvalidArgs))
}

fn catalog_error(e: CatalogError, output: &Output) -> ExitCode {
    match e {
        CatalogError::UnknownTab(_) => output.error(e.to_string(), ExitCode::InvalidArgs),
        CatalogError::MissingRule(_) => output.error(e.to_string(), ExitCode::Error),
    }
}

fn print<T: Serialize>(data: T, output: &Output) -> ExitCode {
    match output.print(data) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

impl From<&MovieItem> for ItemSummary {
    fn from(item: &MovieItem) -> Self {
        let meta = item.meta();
        Self {
            id: item.id.clone(),
            watch_key: item.watch_key(),
            title: meta.title.clone(),
            year: meta.year.clone(),
            category: meta.category.clone(),
            genre: meta.genre.clone(),
            quality: meta.quality_name.clone(),
            is_series: item.is_series,
        }
    }
}

// =============================================================================
// Tabs Command
// =============================================================================

pub async fn tabs_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let catalog = match load_catalog(ctx, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match catalog.tab_counts(&ctx.rules()) {
        Ok(counts) => print(counts, output),
        Err(e) => catalog_error(e, output),
    }
}

// =============================================================================
// List / Search Commands
// =============================================================================

pub async fn list_cmd(cmd: ListCmd, ctx: &Context, output: &Output) -> ExitCode {
    listing(&cmd.tab, None, cmd.limit, ctx, output).await
}

pub async fn search_cmd(cmd: SearchCmd, ctx: &Context, output: &Output) -> ExitCode {
    listing(&cmd.tab, Some(&cmd.query), cmd.limit, ctx, output).await
}

async fn listing(
    tab: &str,
    query: Option<&str>,
    limit: Option<usize>,
    ctx: &Context,
    output: &Output,
) -> ExitCode {
    // Validate before touching the network
    let tab = match parse_tab(tab, output) {
        Ok(t) => t,
        Err(code) => return code,
    };
    let catalog = match load_catalog(ctx, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let view = match catalog.view(tab, query.unwrap_or(""), &ctx.rules()) {
        Ok(v) => v,
        Err(e) => return catalog_error(e, output),
    };

    let response = ListResponse {
        tab: tab.as_str().to_string(),
        query: query.map(str::to_string),
        total: view.len(),
        items: view
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(ItemSummary::from)
            .collect(),
    };
    print(response, output)
}

// =============================================================================
// Info Command
// =============================================================================

pub async fn info_cmd(cmd: InfoCmd, ctx: &Context, output: &Output) -> ExitCode {
    let catalog = match load_catalog(ctx, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match catalog.find(&cmd.id) {
        Some(item) => print(item, output),
        None => output.error(format!("No item with id '{}'", cmd.id), ExitCode::NotFound),
    }
}

// =============================================================================
// Link Resolution
// =============================================================================

/// Why a season/episode selection could not be resolved
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("'{0}' is not a series; drop --season/--episode")]
    NotASeries(String),
    #[error("'{0}' is a series; pass --season and --episode")]
    EpisodeRequired(String),
    #[error("Season {0} not found")]
    SeasonNotFound(usize),
    #[error("Episode {0} not found")]
    EpisodeNotFound(usize),
}

impl LinkError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LinkError::NotASeries(_) | LinkError::EpisodeRequired(_) => ExitCode::InvalidArgs,
            LinkError::SeasonNotFound(_) | LinkError::EpisodeNotFound(_) => ExitCode::NotFound,
        }
    }
}

/// Links of a movie, or of one episode (1-based numbers) of a series
pub fn resolve_links(
    item: &MovieItem,
    season: Option<usize>,
    episode: Option<usize>,
) -> Result<LinksResponse, LinkError> {
    let mut response = LinksResponse {
        id: item.id.clone(),
        title: item.title().to_string(),
        season: None,
        episode: None,
        links: Vec::new(),
    };

    if !item.is_series {
        if season.is_some() || episode.is_some() {
            return Err(LinkError::NotASeries(item.id.clone()));
        }
        response.links = item.links.clone();
        return Ok(response);
    }

    let (Some(s), Some(e)) = (season, episode) else {
        return Err(LinkError::EpisodeRequired(item.id.clone()));
    };
    let found_season = s
        .checked_sub(1)
        .and_then(|i| item.seasons.get(i))
        .ok_or(LinkError::SeasonNotFound(s))?;
    let found_episode = e
        .checked_sub(1)
        .and_then(|i| found_season.episodes.get(i))
        .ok_or(LinkError::EpisodeNotFound(e))?;

    response.season = Some(found_season.name.clone());
    response.episode = Some(found_episode.title.clone());
    response.links = found_episode.playable_links();
    Ok(response)
}

// =============================================================================
// Links Command
// =============================================================================

pub async fn links_cmd(cmd: LinksCmd, ctx: &Context, output: &Output) -> ExitCode {
    let catalog = match load_catalog(ctx, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };
    let Some(item) = catalog.find(&cmd.id) else {
        return output.error(format!("No item with id '{}'", cmd.id), ExitCode::NotFound);
    };

    match resolve_links(item, cmd.season, cmd.episode) {
        Ok(response) if response.links.is_empty() => {
            output.error(format!("No links for '{}'", item.title()), ExitCode::NoLinks)
        }
        Ok(response) => print(response, output),
        Err(e) => output.error(e.to_string(), e.exit_code()),
    }
}

// =============================================================================
// Watch Command
// =============================================================================

/// Pick the 1-based `index`th link
pub fn pick_link(links: &[MediaLink], index: usize) -> Option<&MediaLink> {
    index.checked_sub(1).and_then(|i| links.get(i))
}

pub async fn watch_cmd(cmd: WatchCmd, ctx: &Context, output: &Output) -> ExitCode {
    let catalog = match load_catalog(ctx, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };
    let Some(item) = catalog.find(&cmd.id) else {
        return output.error(format!("No item with id '{}'", cmd.id), ExitCode::NotFound);
    };

    let resolved = match resolve_links(item, cmd.season, cmd.episode) {
        Ok(r) => r,
        Err(e) => return output.error(e.to_string(), e.exit_code()),
    };
    if resolved.links.is_empty() {
        return output.error(format!("No links for '{}'", item.title()), ExitCode::NoLinks);
    }
    let Some(link) = pick_link(&resolved.links, cmd.index) else {
        return output.error(
            format!(
                "Link {} out of range (1-{})",
                cmd.index,
                resolved.links.len()
            ),
            ExitCode::InvalidArgs,
        );
    };

    let title = match &resolved.episode {
        Some(episode) => format!("{} - {}", resolved.title, episode),
        None => resolved.title.clone(),
    };

    if cmd.print {
        return print(
            WatchResponse {
                status: "resolved",
                title,
                url: link.url.clone(),
                player: None,
            },
            output,
        );
    }

    let player_type = cmd
        .player
        .map(PlayerType::from)
        .unwrap_or_else(|| ctx.config.player_type());
    play_locally(&link.url, &title, player_type, output).await
}

async fn play_locally(url: &str, title: &str, player_type: PlayerType, output: &Output) -> ExitCode {
    let player = LocalPlayer::new(player_type);

    // Check if player is available
    if !player.is_available().await {
        return output.error(
            format!("{} not found. Install it first.", player_type.display_name()),
            ExitCode::PlayerFailed,
        );
    }

    output.info(format!("Opening in {}...", player_type.display_name()));

    match player.play(url, title) {
        Ok(_child) => print(
            WatchResponse {
                status: "playing",
                title: title.to_string(),
                url: url.to_string(),
                player: Some(player_type.display_name().to_string()),
            },
            output,
        ),
        Err(e) => output.error(format!("Failed to start player: {}", e), ExitCode::PlayerFailed),
    }
}

// =============================================================================
// Config Command
// =============================================================================

#[derive(Serialize)]
struct ConfigView<'a> {
    path: Option<String>,
    exists: bool,
    source: Option<String>,
    config: &'a Config,
}

pub fn config_cmd(cmd: ConfigCmd, ctx: &Context, output: &Output) -> ExitCode {
    let path = ctx.config_path.clone().or_else(Config::path);

    if cmd.init {
        let Some(path) = path.as_ref() else {
            return output.error("Could not determine config path", ExitCode::Error);
        };
        if path.exists() {
            return output.error(
                format!("{} already exists", path.display()),
                ExitCode::InvalidArgs,
            );
        }
        if let Err(e) = Config::default().save_to(path) {
            return output.error(format!("Failed to write config: {}", e), ExitCode::Error);
        }
        output.info(format!("Wrote {}", path.display()));
    }

    let view = ConfigView {
        exists: path.as_ref().map(|p| p.exists()).unwrap_or(false),
        path: path.map(|p| p.display().to_string()),
        source: ctx.source().ok().map(|s| s.to_string()),
        config: &ctx.config,
    };
    print(view, output)
}

// =============================================================================
// Tests
// =============================================================================
