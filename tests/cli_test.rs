//! CLI command tests
//!
//! Runs the command handlers against a catalog export on disk and checks
//! exit codes and argument handling.

use std::path::PathBuf;

use clap::Parser;
use mflix::cli::{
    Cli, Command, ConfigCmd, ExitCode, InfoCmd, LinksCmd, ListCmd, Output, PlayerChoice,
    SearchCmd, WatchCmd,
};
use mflix::commands::{self, Context};
use mflix::config::Config;
use mflix::source::{CatalogSource, SourceError};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

/// Export with the catalog under the `movies` node
fn write_export(dir: &TempDir) -> PathBuf {
    let export = json!({
        "movies": {
            "k1": {
                "id": "blade-runner", "title": "Blade Runner", "year": 1982,
                "category": "movies", "genre": "Sci-Fi",
                "links": [
                    {"url": "https://cdn.example/br-1080.mp4", "label": "1080p"},
                    {"url": "https://cdn.example/br-720.mp4", "label": "720p"}
                ]
            },
            "k2": {
                "id": "aot", "title": "Attack on Titan", "category": "anime", "isSeries": true,
                "seasons": [{"name": "Season 1", "episodes": [
                    {"title": "To You", "url": "https://cdn.example/aot-1.mp4"},
                    {"title": "That Day"}
                ]}]
            },
            "k3": {"id": "restricted", "title": "Restricted X", "category": "movies", "adult": true},
            "k4": {"id": "no-links", "title": "Lost Reel", "category": "movies"}
        },
        "users": {"u1": {"name": "ignored"}}
    });
    let path = dir.path().join("export.json");
    std::fs::write(&path, serde_json::to_string(&export).unwrap()).unwrap();
    path
}

fn context(dir: &TempDir) -> Context {
    let file = write_export(dir);
    Context::new(
        Config::default(),
        Some(dir.path().join("config.toml")),
        Some(file.display().to_string()),
    )
}

fn output() -> Output {
    Output {
        json: true,
        quiet: true,
    }
}

fn links(id: &str, season: Option<usize>, episode: Option<usize>) -> LinksCmd {
    LinksCmd {
        id: id.into(),
        season,
        episode,
    }
}

fn watch_print(id: &str, index: usize) -> WatchCmd {
    WatchCmd {
        id: id.into(),
        season: None,
        episode: None,
        index,
        player: None,
        print: true,
    }
}

// =============================================================================
// Argument Parsing
// =============================================================================

#[test]
fn test_parse_links_with_episode() {
    let cli = Cli::parse_from(["mflix", "links", "aot", "-s", "1", "-e", "3", "--json"]);
    assert!(cli.json);
    match cli.command {
        Some(Command::Links(cmd)) => {
            assert_eq!(cmd.id, "aot");
            assert_eq!(cmd.season, Some(1));
            assert_eq!(cmd.episode, Some(3));
        }
        _ => panic!("Expected Links command"),
    }
}

#[test]
fn test_parse_watch_player_choice() {
    let cli = Cli::parse_from(["mflix", "w", "blade-runner", "--player", "mpv", "-i", "2"]);
    match cli.command {
        Some(Command::Watch(cmd)) => {
            assert_eq!(cmd.player, Some(PlayerChoice::Mpv));
            assert_eq!(cmd.index, 2);
            assert!(!cmd.print);
        }
        _ => panic!("Expected Watch command"),
    }
}

#[test]
fn test_parse_rejects_missing_query() {
    assert!(Cli::try_parse_from(["mflix", "search"]).is_err());
}

#[test]
fn test_parse_source_flag() {
    let cli = Cli::parse_from(["mflix", "-S", "export.json", "tabs"]);
    assert_eq!(cli.source.as_deref(), Some("export.json"));
    assert!(matches!(cli.command, Some(Command::Tabs)));
}

#[test]
fn test_parse_source_from_env() {
    std::env::set_var("MFLIX_SOURCE", "from-env.json");
    let from_env = Cli::parse_from(["mflix", "tabs"]);
    let overridden = Cli::parse_from(["mflix", "-S", "flag.json", "tabs"]);
    std::env::remove_var("MFLIX_SOURCE");

    assert_eq!(from_env.source.as_deref(), Some("from-env.json"));
    assert_eq!(overridden.source.as_deref(), Some("flag.json"));
}

// =============================================================================
// Sources
// =============================================================================

#[tokio::test]
async fn test_file_source_descends_into_node() {
    let dir = TempDir::new().unwrap();
    let file = write_export(&dir);

    let source = CatalogSource::parse(&file.display().to_string(), "movies");
    assert!(!source.is_live());

    let catalog = source.catalog().await.unwrap();
    assert_eq!(catalog.len(), 4);
    assert!(catalog.find("aot").is_some());
}

#[tokio::test]
async fn test_file_source_errors() {
    let dir = TempDir::new().unwrap();

    let missing = CatalogSource::parse(&dir.path().join("nope.json").display().to_string(), "movies");
    assert!(matches!(missing.load().await, Err(SourceError::Io { .. })));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{not json").unwrap();
    let broken = CatalogSource::parse(&broken.display().to_string(), "movies");
    assert!(matches!(broken.load().await, Err(SourceError::Parse { .. })));
}

// =============================================================================
// Command Handlers
// =============================================================================

#[tokio::test]
async fn test_tabs_and_list() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    assert_eq!(commands::tabs_cmd(&ctx, &output()).await, ExitCode::Success);

    let cmd = ListCmd {
        tab: "movies".into(),
        limit: Some(1),
    };
    assert_eq!(commands::list_cmd(cmd, &ctx, &output()).await, ExitCode::Success);
}

#[tokio::test]
async fn test_search_unknown_tab_is_invalid() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let cmd = SearchCmd {
        query: "blade".into(),
        tab: "documentaries".into(),
        limit: None,
    };
    assert_eq!(commands::search_cmd(cmd, &ctx, &output()).await, ExitCode::InvalidArgs);
}

#[tokio::test]
async fn test_info_found_and_missing() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let found = InfoCmd { id: "blade-runner".into() };
    assert_eq!(commands::info_cmd(found, &ctx, &output()).await, ExitCode::Success);

    let missing = InfoCmd { id: "nothing".into() };
    assert_eq!(commands::info_cmd(missing, &ctx, &output()).await, ExitCode::NotFound);
}

#[tokio::test]
async fn test_links_exit_codes() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let out = output();

    assert_eq!(
        commands::links_cmd(links("blade-runner", None, None), &ctx, &out).await,
        ExitCode::Success
    );
    assert_eq!(
        commands::links_cmd(links("aot", Some(1), Some(1)), &ctx, &out).await,
        ExitCode::Success
    );
    assert_eq!(
        commands::links_cmd(links("aot", None, None), &ctx, &out).await,
        ExitCode::InvalidArgs
    );
    assert_eq!(
        commands::links_cmd(links("aot", Some(9), Some(1)), &ctx, &out).await,
        ExitCode::NotFound
    );
    assert_eq!(
        commands::links_cmd(links("aot", Some(1), Some(2)), &ctx, &out).await,
        ExitCode::NoLinks
    );
    assert_eq!(
        commands::links_cmd(links("no-links", None, None), &ctx, &out).await,
        ExitCode::NoLinks
    );
    assert_eq!(
        commands::links_cmd(links("blade-runner", Some(1), None), &ctx, &out).await,
        ExitCode::InvalidArgs
    );
}

#[tokio::test]
async fn test_watch_print_resolves_link() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    assert_eq!(
        commands::watch_cmd(watch_print("blade-runner", 2), &ctx, &output()).await,
        ExitCode::Success
    );
    assert_eq!(
        commands::watch_cmd(watch_print("blade-runner", 3), &ctx, &output()).await,
        ExitCode::InvalidArgs
    );
    assert_eq!(
        commands::watch_cmd(watch_print("no-links", 1), &ctx, &output()).await,
        ExitCode::NoLinks
    );
}

#[tokio::test]
async fn test_unreadable_source_is_source_error() {
    let dir = TempDir::new().unwrap();
    let ctx = Context::new(
        Config::default(),
        None,
        Some(dir.path().join("missing.json").display().to_string()),
    );

    assert_eq!(commands::tabs_cmd(&ctx, &output()).await, ExitCode::SourceError);
}

#[test]
fn test_config_init_writes_once() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let path = dir.path().join("config.toml");

    assert_eq!(
        commands::config_cmd(ConfigCmd { init: true }, &ctx, &output()),
        ExitCode::Success
    );
    assert!(path.exists());
    assert_eq!(Config::load_from(&path), Config::default());

    assert_eq!(
        commands::config_cmd(ConfigCmd { init: true }, &ctx, &output()),
        ExitCode::InvalidArgs
    );
}
