//! Catalog browser view
//!
//! Displays the current tab (narrowed by the search query) in a
//! selectable list.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
};

use crate::app::ListState;
use crate::models::MovieItem;
use crate::ui::Theme;

/// Browser view over a borrowed slice of the catalog
pub struct BrowserView<'a> {
    items: Vec<&'a MovieItem>,
    list: &'a ListState,
    title: String,
    empty_message: &'a str,
    focused: bool,
}

impl<'a> BrowserView<'a> {
    pub fn new(items: Vec<&'a MovieItem>, list: &'a ListState, title: impl Into<String>) -> Self {
        Self {
            items,
            list,
            title: title.into(),
            empty_message: "No titles here yet",
            focused: true,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }

    /// First visible row for a viewport of `height` rows
    pub fn viewport_offset(&self, height: usize) -> usize {
        let mut list = self.list.clone();
        list.scroll_into_view(height);
        list.offset
    }

    /// Render the browser view
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        if self.items.is_empty() {
            let empty = Paragraph::new(self.empty_message)
                .style(Theme::dimmed())
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .border_type(BorderType::Rounded)
                        .title(Span::styled(format!(" {} ", self.title), Theme::title())),
                );
            frame.render_widget(empty, area);
            return;
        }

        // Visible height minus borders
        let visible_height = area.height.saturating_sub(2) as usize;
        let offset = self.viewport_offset(visible_height);

        let rows: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible_height)
            .map(|(i, item)| self.render_item(i, item))
            .collect();

        let title = format!(
            " {} ({}/{}) ",
            self.title,
            self.list.selected + 1,
            self.items.len()
        );

        let list = List::new(rows)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .border_type(BorderType::Rounded)
                    .title(Span::styled(title, Theme::title()))
                    .title_alignment(Alignment::Left),
            )
            .style(Theme::text());

        frame.render_widget(list, area);
    }

    /// Format: ▸ Title (Year)  [1080p]  ★ 8.1  Sci-Fi
    fn render_item(&self, index: usize, item: &MovieItem) -> ListItem<'static> {
        let is_selected = index == self.list.selected;
        let meta = item.meta();

        let marker = if is_selected { "▸ " } else { "  " };

        let mut spans = vec![
            Span::styled(
                marker.to_string(),
                if is_selected { Theme::accent() } else { Theme::dimmed() },
            ),
            Span::styled(
                item.title().to_string(),
                if is_selected {
                    Theme::list_item_selected()
                } else {
                    Theme::list_item()
                },
            ),
        ];

        if !meta.year.is_empty() {
            spans.push(Span::styled(format!(" ({})", meta.year), Theme::year()));
        }

        let badge = if item.is_series {
            Some(match item.seasons.len() {
                1 => "1 season".to_string(),
                n => format!("{} seasons", n),
            })
        } else if !meta.quality_name.is_empty() {
            Some(meta.quality_name.clone())
        } else {
            None
        };
        if let Some(badge) = badge {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("[{}]", badge), Theme::badge()));
        }

        if !meta.rating.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("★ {}", meta.rating), Theme::secondary()));
        }

        if !meta.genre.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(meta.genre.clone(), Theme::genre()));
        }

        if item.adult {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("18+".to_string(), Theme::error()));
        }

        ListItem::new(Line::from(spans))
    }
}
