//! Tab bar
//!
//! One entry per `TAB_CONFIG` row, labelled with its item count.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Tabs},
};

use crate::catalog::TabCount;
use crate::models::{TabId, TAB_CONFIG};
use crate::ui::Theme;

pub struct TabBar<'a> {
    active: TabId,
    counts: &'a [TabCount],
}

impl<'a> TabBar<'a> {
    pub fn new(active: TabId, counts: &'a [TabCount]) -> Self {
        Self { active, counts }
    }

    /// Label shown for a tab, e.g. "3 Anime (12)"
    pub fn label(&self, tab: TabId) -> String {
        let count = self.counts.iter().find(|c| c.id == tab).map(|c| c.count);
        match count {
            Some(n) => format!("{} {} ({})", tab.index() + 1, tab.label(), n),
            None => format!("{} {}", tab.index() + 1, tab.label()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = TAB_CONFIG
            .iter()
            .map(|tab| Line::from(self.label(tab.id)))
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.active.index())
            .style(Theme::tab_inactive())
            .highlight_style(Theme::tab_active())
            .divider(Span::styled("│", Theme::dimmed()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Theme::border()),
            );

        frame.render_widget(tabs, area);
    }
}
