//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first navigation throughout.
//! `render` draws the whole screen from an `App`.

pub mod browser;
pub mod tabs;
pub mod theme;
pub mod watch;

pub use browser::BrowserView;
pub use tabs::TabBar;
pub use theme::Theme;
pub use watch::WatchView;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, InputMode};

/// Main render function - dispatches to view-specific renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Clear with background color
    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BACKGROUND)), area);

    // Header, tab bar, content, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    TabBar::new(app.tab, app.tab_counts()).render(frame, chunks[1]);
    render_content(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Logo and search box
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(12), Constraint::Min(1)])
        .split(area);

    let logo = Paragraph::new(Line::from(Span::styled(
        "MFLIX",
        Style::default()
            .fg(Theme::PRIMARY)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(logo, header_chunks[0]);

    let editing = app.input_mode == InputMode::Editing;
    let search_line = if editing {
        let query = &app.search.query;
        let at = query
            .char_indices()
            .nth(app.search.cursor)
            .map(|(i, _)| i)
            .unwrap_or(query.len());
        let (before, after) = query.split_at(at);
        Line::from(vec![
            Span::raw(format!("⌕ {}", before)),
            Span::styled("│", Theme::input_cursor()),
            Span::raw(after.to_string()),
        ])
    } else if app.search.query.is_empty() {
        Line::from("⌕ Type / to search...")
    } else {
        Line::from(format!("⌕ {}", app.search.query))
    };

    let search_box = Paragraph::new(search_line)
        .style(if editing {
            Theme::input().fg(Theme::WHITE)
        } else {
            Theme::input()
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if editing {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(" SEARCH ", Theme::title())),
        );
    frame.render_widget(search_box, header_chunks[1]);
}

fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(message) = app.loading.message().filter(|_| app.catalog().is_empty()) {
        let style = if app.loading.is_error() {
            Theme::error()
        } else {
            Theme::loading()
        };
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(message, style))])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Theme::border()),
            );
        frame.render_widget(paragraph, area);
        return;
    }

    match (app.state, app.watch.as_ref(), app.watch_item()) {
        (AppState::Watch, Some(state), Some(item)) => {
            WatchView::new(item, state).render(frame, area);
        }
        _ => {
            let title = if app.search.is_active() {
                format!("{} · \"{}\"", app.tab.label().to_uppercase(), app.search.query.trim())
            } else {
                app.tab.label().to_uppercase()
            };
            let empty = if app.search.is_active() {
                "Nothing matches your search"
            } else {
                "No titles here yet"
            };
            BrowserView::new(app.visible_items().collect(), &app.list, title)
                .focused(app.input_mode == InputMode::Normal)
                .empty_message(empty)
                .render(frame, area);
        }
    }
}

/// Mode, catalog size, live indicator, key help
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode_indicator = match app.input_mode {
        InputMode::Normal => Span::styled(
            " NORMAL ",
            Style::default().fg(Theme::WHITE).bg(Theme::PRIMARY),
        ),
        InputMode::Editing => Span::styled(
            " SEARCH ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::ACCENT),
        ),
    };

    let live_indicator = if app.live {
        Span::styled(" ● LIVE ", Theme::success())
    } else {
        Span::styled(" ○ offline ", Theme::dimmed())
    };

    let count = Span::styled(format!(" {} titles ", app.catalog().len()), Theme::secondary());

    let help: &[(&str, &str)] = match app.state {
        AppState::Browse => &[
            ("q", "quit"),
            ("/", "search"),
            ("tab", "next tab"),
            ("1-5", "tab"),
            ("enter", "watch"),
            ("r", "reload"),
        ],
        AppState::Watch => &[
            ("q", "quit"),
            ("enter", "select/play"),
            ("esc", "back"),
            ("r", "reload"),
        ],
    };

    let mut spans = vec![mode_indicator, live_indicator, count, Span::raw("│")];
    match &app.status {
        Some(status) => spans.push(Span::styled(format!(" {} ", status), Theme::warning())),
        None => {
            for (key, desc) in help {
                spans.push(Span::styled(format!(" {}", key), Theme::keybind()));
                spans.push(Span::styled(format!(":{} ", desc), Theme::keybind_desc()));
            }
        }
    }

    let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
    frame.render_widget(status, area);
}

/// Render error popup overlay
fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(error_block, popup_area);
}
