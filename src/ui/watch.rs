//! Watch view
//!
//! Info panel for one item above its playable content: a link list for
//! movies, or seasons → episodes → links columns for series.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{ListState, WatchFocus, WatchState};
use crate::models::{MovieItem, PrimaryContent};
use crate::ui::Theme;

/// Watch view over one catalog item
pub struct WatchView<'a> {
    item: &'a MovieItem,
    state: &'a WatchState,
}

impl<'a> WatchView<'a> {
    pub fn new(item: &'a MovieItem, state: &'a WatchState) -> Self {
        Self { item, state }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(3)])
            .split(area);

        self.render_info_panel(frame, chunks[0]);

        match self.item.primary_content() {
            PrimaryContent::Links(_) => self.render_links_panel(frame, chunks[1]),
            PrimaryContent::Seasons(_) => {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(25),
                        Constraint::Percentage(40),
                        Constraint::Percentage(35),
                    ])
                    .split(chunks[1]);
                self.render_seasons_panel(frame, columns[0]);
                self.render_episodes_panel(frame, columns[1]);
                self.render_links_panel(frame, columns[2]);
            }
        }
    }

    fn render_info_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border())
            .title(Span::styled(" INFO ", Theme::title()));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let meta = self.item.meta();
        let mut lines = Vec::new();

        let year = if meta.year.is_empty() {
            String::new()
        } else {
            format!(" ({})", meta.year)
        };
        lines.push(Line::from(vec![
            Span::styled("▶ ", Theme::accent()),
            Span::styled(self.item.title().to_string(), Theme::title()),
            Span::styled(year, Theme::secondary()),
        ]));

        // Rating │ quality │ runtime │ cert │ language, whichever are set
        let facts: Vec<String> = [
            (!meta.rating.is_empty()).then(|| format!("★ {}", meta.rating)),
            (!meta.quality_name.is_empty()).then(|| meta.quality_name.clone()),
            (!meta.runtime.is_empty()).then(|| meta.runtime.clone()),
            (!meta.cert.is_empty()).then(|| meta.cert.clone()),
            (!meta.language.is_empty()).then(|| meta.language.clone()),
            self.item
                .is_series
                .then(|| format!("{} episodes", self.item.episode_count())),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !facts.is_empty() {
            let mut spans = Vec::new();
            for (i, fact) in facts.into_iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", Theme::dimmed()));
                }
                spans.push(Span::styled(fact, Theme::secondary()));
            }
            lines.push(Line::from(spans));
        }

        let tags: Vec<&str> = [meta.category.as_str(), meta.genre.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !tags.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Genre: ", Theme::dimmed()),
                Span::styled(tags.join(" · "), Theme::text()),
            ]));
        }

        if !meta.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                meta.description.clone(),
                Theme::text(),
            )));
        }

        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn render_seasons_panel(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<String> = self
            .item
            .seasons
            .iter()
            .map(|s| format!("{} ({} eps)", s.name, s.episodes.len()))
            .collect();
        render_column(
            frame,
            area,
            "SEASONS",
            &rows,
            &self.state.seasons,
            self.state.focus == WatchFocus::Seasons,
            "No seasons",
        );
    }

    fn render_episodes_panel(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<String> = self
            .item
            .seasons
            .get(self.state.seasons.selected)
            .map(|s| s.episodes.iter().map(|e| e.title.clone()).collect())
            .unwrap_or_default();
        render_column(
            frame,
            area,
            "EPISODES",
            &rows,
            &self.state.episodes,
            self.state.focus == WatchFocus::Episodes,
            "No episodes",
        );
    }

    fn render_links_panel(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<String> = self
            .state
            .links_of(self.item)
            .iter()
            .enumerate()
            .map(|(i, link)| format!("[{}] {}", i + 1, link))
            .collect();
        render_column(
            frame,
            area,
            "LINKS",
            &rows,
            &self.state.links,
            self.state.focus == WatchFocus::Links,
            "No links available",
        );
    }
}

/// One selectable column with a counted title
fn render_column(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[String],
    list: &ListState,
    focused: bool,
    empty: &str,
) {
    let border_style = if focused {
        Theme::border_focused()
    } else {
        Theme::border()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ({}) ", title, rows.len()),
            Theme::title(),
        ));

    if rows.is_empty() {
        let paragraph = Paragraph::new(empty.to_string())
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let mut viewport = list.clone();
    viewport.scroll_into_view(height);

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(viewport.offset)
        .take(height)
        .map(|(i, row)| {
            let is_selected = i == list.selected;
            let marker = if is_selected { "▸ " } else { "  " };
            let style = match (is_selected, focused) {
                (true, true) => Theme::list_item_selected(),
                (true, false) => Theme::selected(),
                _ => Theme::list_item(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    marker,
                    if is_selected { Theme::accent() } else { Theme::dimmed() },
                ),
                Span::styled(row.clone(), style),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
