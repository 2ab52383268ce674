//! CLI - Command Line Interface for MFLIX
//!
//! Every TUI action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Browse a tab
//! mflix list --tab anime --json
//!
//! # Search within a tab
//! mflix search "blade" --tab movies
//!
//! # Play an episode
//! mflix watch attack-on-titan --season 1 --episode 3 --player mpv
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::player::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or data source error
    SourceError = 3,
    /// Item, season or episode not found
    NotFound = 4,
    /// Nothing playable
    NoLinks = 5,
    /// Player failed to start
    PlayerFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// MFLIX - terminal front-end for the MFLIX catalog
///
/// Run without arguments to launch interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "mflix",
    version,
    about = "Browse, search and watch the MFLIX catalog from the terminal",
    long_about = "A tabbed terminal front-end for the MFLIX catalog: movies, \
                  TV shows and anime, live from the realtime database.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  mflix                               Launch interactive TUI\n\
                  mflix tabs                          Show tabs and item counts\n\
                  mflix search \"blade runner\"         Search the home tab\n\
                  mflix links aot -s 1 -e 3 --json    Links of an episode"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Catalog source: database URL or JSON export file
    #[arg(long, short = 'S', global = true, env = "MFLIX_SOURCE")]
    pub source: Option<String>,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tabs with their item counts
    #[command(visible_alias = "t")]
    Tabs,

    /// List the items of a tab
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Search titles, genres, categories and more
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Show everything known about an item
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// List the playable links of a movie or episode
    #[command(visible_alias = "l")]
    Links(LinksCmd),

    /// Play an item in VLC or mpv
    #[command(visible_alias = "w")]
    Watch(WatchCmd),

    /// Show or initialize the configuration
    Config(ConfigCmd),
}

// =============================================================================
// Listing Commands
// =============================================================================

/// List a tab in catalog order
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Tab to list (home, movies, tvshow, anime, adult)
    #[arg(long, short = 't', default_value = "home")]
    pub tab: String,

    /// Maximum number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Search a tab by free text
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search query (case-insensitive substring)
    #[arg(required = true)]
    pub query: String,

    /// Tab to search (home, movies, tvshow, anime, adult)
    #[arg(long, short = 't', default_value = "home")]
    pub tab: String,

    /// Maximum number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

// =============================================================================
// Item Commands
// =============================================================================

/// Show one item
#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Item id, watch key or store key
    #[arg(required = true)]
    pub id: String,
}

/// List playable links
#[derive(Args, Debug)]
pub struct LinksCmd {
    /// Item id, watch key or store key
    #[arg(required = true)]
    pub id: String,

    /// Season number, 1-based (series only)
    #[arg(long, short = 's')]
    pub season: Option<usize>,

    /// Episode number, 1-based (series only)
    #[arg(long, short = 'e')]
    pub episode: Option<usize>,
}

/// Play a link locally
#[derive(Args, Debug)]
pub struct WatchCmd {
    /// Item id, watch key or store key
    #[arg(required = true)]
    pub id: String,

    /// Season number, 1-based (series only)
    #[arg(long, short = 's')]
    pub season: Option<usize>,

    /// Episode number, 1-based (series only)
    #[arg(long, short = 'e')]
    pub episode: Option<usize>,

    /// Link number, 1-based (default: first link)
    #[arg(long, short = 'i', default_value = "1")]
    pub index: usize,

    /// Player to use (default from config, else vlc)
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Print the resolved link instead of playing it
    #[arg(long)]
    pub print: bool,
}

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChoice {
    /// VLC media player
    Vlc,
    /// mpv media player
    Mpv,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Vlc => PlayerType::Vlc,
            PlayerChoice::Mpv => PlayerType::Mpv,
        }
    }
}

/// Show or write the config file
#[derive(Args, Debug)]
pub struct ConfigCmd {
    /// Write the default configuration (refuses to overwrite)
    #[arg(long)]
    pub init: bool,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Compact listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    pub watch_key: String,
    pub title: String,
    pub year: String,
    pub category: String,
    pub genre: String,
    pub quality: String,
    pub is_series: bool,
}

/// Listing of one tab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub tab: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub total: usize,
    pub items: Vec<ItemSummary>,
}

/// Links of a movie or episode
#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    pub links: Vec<crate::models::MediaLink>,
}

/// Playback started response
#[derive(Debug, Serialize)]
pub struct WatchResponse {
    pub status: &'static str,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
