//! MFLIX - terminal browser for a realtime movie and series catalog
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! mflix
//!
//! # CLI mode (for automation)
//! mflix search "blade runner" --tab movies
//! mflix links attack-on-titan -s 1 -e 3 --json
//! mflix watch blade-runner --player mpv
//! ```

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mflix::api::{FirebaseClient, FirebaseError, LiveTree, TreeEvent};
use mflix::app::{App, LoadingState};
use mflix::catalog::Catalog;
use mflix::cli::{Cli, Command, ExitCode, Output};
use mflix::commands::{self, Context};
use mflix::config::Config;
use mflix::logging::{self, LogTarget};
use mflix::player::LocalPlayer;
use mflix::source::{CatalogSource, SourceError};
use mflix::ui;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        if let Err(e) = logging::init(LogTarget::Stderr, cli.verbose) {
            eprintln!("Logging disabled: {}", e);
        }
        let exit_code = run_cli(cli, config).await;
        std::process::exit(exit_code.into());
    } else {
        // TUI mode: the terminal is ours, so logs go to a file
        if let Err(e) = logging::init(LogTarget::File, cli.verbose) {
            eprintln!("Logging disabled: {}", e);
        }
        run_tui(config, cli.source).await
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config) -> ExitCode {
    let output = Output::new(&cli);
    let ctx = Context::new(config, cli.config.clone(), cli.source.clone());

    match cli.command {
        Some(Command::Tabs) => commands::tabs_cmd(&ctx, &output).await,

        Some(Command::List(cmd)) => commands::list_cmd(cmd, &ctx, &output).await,

        Some(Command::Search(cmd)) => commands::search_cmd(cmd, &ctx, &output).await,

        Some(Command::Info(cmd)) => commands::info_cmd(cmd, &ctx, &output).await,

        Some(Command::Links(cmd)) => commands::links_cmd(cmd, &ctx, &output).await,

        Some(Command::Watch(cmd)) => commands::watch_cmd(cmd, &ctx, &output).await,

        Some(Command::Config(cmd)) => commands::config_cmd(cmd, &ctx, &output),

        None => {
            // This shouldn't happen (handled by is_cli_mode check)
            ExitCode::Success
        }
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(config: Config, source_override: Option<String>) -> Result<()> {
    let source = config.source(source_override.as_deref());
    let session = Session::new(source, config.live);
    let player = LocalPlayer::new(config.player_type());

    let mut terminal = init_terminal()?;
    let mut app = App::new(config.tab_rules());

    let result = run_event_loop(&mut terminal, &mut app, session, player).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result
}

/// Main event loop - handles input, applies catalog updates, renders UI
async fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    mut session: Session,
    player: LocalPlayer,
) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    session.reload(app);

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        session.drain(app);

        if app.take_reload_request() {
            session.reload(app);
        }

        if let Some(request) = app.take_play_request() {
            match player.play(&request.url, &request.title) {
                Ok(mut child) => {
                    app.status = Some(format!(
                        "Playing {} in {}",
                        request.title,
                        player.player_type().display_name()
                    ));
                    // Reap the player when it exits
                    tokio::spawn(async move {
                        if let Ok(status) = child.wait().await {
                            debug!(%status, "player exited");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "player failed");
                    app.set_error(e.to_string());
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// Catalog Session
// =============================================================================

/// Background catalog loading plus the live update stream
struct Session {
    source: Option<CatalogSource>,
    live_enabled: bool,
    tree: Option<LiveTree>,
    load_tx: UnboundedSender<Result<Value, String>>,
    load_rx: UnboundedReceiver<Result<Value, String>>,
    stream: Option<LiveStream>,
}

struct LiveStream {
    events: UnboundedReceiver<TreeEvent>,
    task: JoinHandle<Result<(), FirebaseError>>,
}

impl Session {
    fn new(source: Option<CatalogSource>, live_enabled: bool) -> Self {
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        Self {
            source,
            live_enabled,
            tree: None,
            load_tx,
            load_rx,
            stream: None,
        }
    }

    /// Fetch the whole tree again in the background
    fn reload(&mut self, app: &mut App) {
        let Some(source) = self.source.clone() else {
            app.loading = LoadingState::Error(SourceError::NotConfigured.to_string());
            return;
        };

        app.loading = LoadingState::Loading(Some(format!("Loading catalog from {}...", source)));
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = source.load().await.map_err(|e| e.to_string());
            let _ = tx.send(result);
        });
    }

    /// Apply finished loads and pending live events
    fn drain(&mut self, app: &mut App) {
        while let Ok(result) = self.load_rx.try_recv() {
            match result {
                Ok(root) => {
                    let tree = LiveTree::new(root);
                    let catalog = Catalog::from_tree(tree.root());
                    info!(items = catalog.len(), "catalog loaded");
                    app.set_catalog(catalog);
                    self.tree = Some(tree);
                    self.start_stream();
                }
                Err(msg) => {
                    error!(error = %msg, "catalog load failed");
                    app.loading = LoadingState::Error(msg.clone());
                    app.set_error(msg);
                }
            }
        }

        let (Some(stream), Some(tree)) = (self.stream.as_mut(), self.tree.as_mut()) else {
            app.live = false;
            return;
        };

        // Read before draining so events sent just before exit are applied
        let finished = stream.task.is_finished();

        let mut changed = false;
        while let Ok(event) = stream.events.try_recv() {
            changed |= tree.apply(&event);
        }
        if changed {
            app.set_catalog(Catalog::from_tree(tree.root()));
        }

        if finished {
            app.live = false;
            app.status = Some("Live updates stopped (r to reload)".to_string());
            self.stream = None;
        } else {
            app.live = true;
        }
    }

    fn start_stream(&mut self) {
        if !self.live_enabled || self.stream.is_some() {
            return;
        }
        let Some(CatalogSource::Remote { url, path }) = self.source.clone() else {
            return;
        };

        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let result = FirebaseClient::new(url).subscribe(&path, tx).await;
            if let Err(ref e) = result {
                warn!(error = %e, "catalog stream ended");
            }
            result
        });
        self.stream = Some(LiveStream { events, task });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mflix::catalog::TabRules;
    use serde_json::json;

    #[tokio::test]
    async fn test_drain_applies_events_sent_before_stream_ends() {
        let mut app = App::new(TabRules::default());
        let mut session = Session::new(None, true);
        let tree = LiveTree::new(json!({"a": {"title": "Alien", "category": "movies"}}));
        app.set_catalog(Catalog::from_tree(tree.root()));
        session.tree = Some(tree);

        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let _ = tx.send(TreeEvent::Put {
                path: "/b".into(),
                data: json!({"title": "Akira", "category": "anime"}),
            });
            Ok::<(), FirebaseError>(())
        });
        while !task.is_finished() {
            tokio::task::yield_now().await;
        }
        session.stream = Some(LiveStream { events, task });

        session.drain(&mut app);

        assert_eq!(app.catalog().len(), 2);
        assert!(app.catalog().find("b").is_some());
        assert!(!app.live);
        assert!(session.stream.is_none());
        assert_eq!(
            app.status.as_deref(),
            Some("Live updates stopped (r to reload)")
        );
    }
}
