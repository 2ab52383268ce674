//! App state and core application logic
//!
//! Manages the application state machine, navigation stack, tab and
//! search state, and the watch view over the current catalog snapshot.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::catalog::{Catalog, TabCount, TabRules};
use crate::models::{MediaLink, MovieItem, PrimaryContent, TabId, TAB_CONFIG};

// =============================================================================
// App State Enum
// =============================================================================

/// Application state enum representing current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Tabbed catalog listing with search
    #[default]
    Browse,
    /// Links (or seasons/episodes) of one item
    Watch,
}

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search box focused)
    Editing,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state of the catalog
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// Selection State (per-view)
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for viewport
    pub offset: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    /// Move selection up
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Move selection up by a page
    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        if self.selected < self.offset {
            self.offset = self.selected;
        }
    }

    /// Move selection down by a page
    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    /// Jump to first item
    pub fn first(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// Jump to last item
    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update offset to keep selected item visible
    pub fn scroll_into_view(&mut self, visible_height: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if visible_height > 0 && self.selected >= self.offset + visible_height {
            self.offset = self.selected - visible_height + 1;
        }
    }

    /// Reset selection
    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// Update length (e.g., when the view changes)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
            self.offset = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        if self.offset > self.selected {
            self.offset = self.selected;
        }
    }
}

// =============================================================================
// Search State
// =============================================================================

/// Search box state. `cursor` counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub cursor: usize,
}

impl SearchState {
    fn byte_index(&self, cursor: usize) -> usize {
        self.query
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.query.len())
    }

    fn char_len(&self) -> usize {
        self.query.chars().count()
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.query.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    /// Delete character at cursor
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clear query
    pub fn clear(&mut self) {
        self.query.clear();
        self.cursor = 0;
    }

    /// Whether the query filters anything
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

// =============================================================================
// Watch State
// =============================================================================

/// Focused column of the watch view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchFocus {
    Seasons,
    Episodes,
    Links,
}

/// Watch view state, keyed by the item's store key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    pub source_id: String,
    pub focus: WatchFocus,
    pub seasons: ListState,
    pub episodes: ListState,
    pub links: ListState,
}

impl WatchState {
    pub fn new(item: &MovieItem) -> Self {
        let mut state = Self {
            source_id: item.source_id.clone(),
            focus: WatchFocus::Links,
            seasons: ListState::new(0),
            episodes: ListState::new(0),
            links: ListState::new(0),
        };
        match item.primary_content() {
            PrimaryContent::Links(links) => state.links.set_len(links.len()),
            PrimaryContent::Seasons(seasons) => {
                state.focus = WatchFocus::Seasons;
                state.seasons.set_len(seasons.len());
                state.sync_lengths(item);
            }
        }
        state
    }

    /// Clamp all selections to the item's current shape
    pub fn sync_lengths(&mut self, item: &MovieItem) {
        match item.primary_content() {
            PrimaryContent::Links(links) => self.links.set_len(links.len()),
            PrimaryContent::Seasons(seasons) => {
                self.seasons.set_len(seasons.len());
                let episodes = seasons
                    .get(self.seasons.selected)
                    .map(|s| s.episodes.len())
                    .unwrap_or(0);
                self.episodes.set_len(episodes);
                self.links.set_len(self.links_of(item).len());
            }
        }
    }

    /// Playable links at the current selection
    pub fn links_of(&self, item: &MovieItem) -> Vec<MediaLink> {
        match item.primary_content() {
            PrimaryContent::Links(links) => links.to_vec(),
            PrimaryContent::Seasons(seasons) => seasons
                .get(self.seasons.selected)
                .and_then(|s| s.episodes.get(self.episodes.selected))
                .map(|e| e.playable_links())
                .unwrap_or_default(),
        }
    }

    /// List under keyboard focus
    pub fn focused_list(&mut self) -> &mut ListState {
        match self.focus {
            WatchFocus::Seasons => &mut self.seasons,
            WatchFocus::Episodes => &mut self.episodes,
            WatchFocus::Links => &mut self.links,
        }
    }

    /// Step focus back toward the seasons column
    pub fn focus_back(&mut self, is_series: bool) -> bool {
        if !is_series {
            return false;
        }
        match self.focus {
            WatchFocus::Links => {
                self.focus = WatchFocus::Episodes;
                true
            }
            WatchFocus::Episodes => {
                self.focus = WatchFocus::Seasons;
                true
            }
            WatchFocus::Seasons => false,
        }
    }
}

/// Link the user asked to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub url: String,
    pub title: String,
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Current state/screen
    pub state: AppState,
    /// Navigation history stack
    pub nav_stack: Vec<AppState>,
    /// Whether the app is running
    pub running: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Global error message
    pub error: Option<String>,
    /// Catalog loading state
    pub loading: LoadingState,
    /// Whether live updates are flowing
    pub live: bool,
    /// Transient status line message
    pub status: Option<String>,

    pub tab: TabId,
    pub search: SearchState,
    pub list: ListState,
    pub watch: Option<WatchState>,

    catalog: Catalog,
    rules: TabRules,
    /// Catalog positions of the current tab + query view
    visible: Vec<usize>,
    counts: Vec<TabCount>,
    pending_play: Option<PlayRequest>,
    reload_requested: bool,
}

impl App {
    pub fn new(rules: TabRules) -> Self {
        let mut app = Self {
            state: AppState::Browse,
            nav_stack: Vec::new(),
            running: true,
            input_mode: InputMode::Normal,
            error: None,
            loading: LoadingState::Idle,
            live: false,
            status: None,
            tab: TabId::Home,
            search: SearchState::default(),
            list: ListState::default(),
            watch: None,
            catalog: Catalog::default(),
            rules,
            visible: Vec::new(),
            counts: Vec::new(),
            pending_play: None,
            reload_requested: false,
        };
        app.refresh_view();
        app
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace the catalog wholesale, keeping the selection on the same
    /// store key when it survives.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        let selected = self.selected_item().map(|i| i.source_id.clone());
        self.catalog = catalog;
        self.loading = LoadingState::Idle;
        self.refresh_view();

        if let Some(key) = selected {
            let found = self.visible_items().position(|i| i.source_id == key);
            if let Some(pos) = found {
                self.list.selected = pos;
            }
        }

        if let Some(mut watch) = self.watch.take() {
            match self.item_by_source(&watch.source_id) {
                Some(item) => {
                    watch.sync_lengths(item);
                    self.watch = Some(watch);
                }
                None => {
                    if self.state == AppState::Watch {
                        self.state = AppState::Browse;
                        self.nav_stack.clear();
                        self.set_error("This title was removed from the catalog");
                    }
                }
            }
        }
    }

    fn item_by_source(&self, source_id: &str) -> Option<&MovieItem> {
        self.catalog.items().iter().find(|i| i.source_id == source_id)
    }

    /// Recompute the tab + query view and tab counts
    pub fn refresh_view(&mut self) {
        let items = self.catalog.items();
        match self.catalog.view(self.tab, &self.search.query, &self.rules) {
            Ok(view) => self.visible = positions(items, &view),
            Err(e) => {
                self.visible.clear();
                self.error = Some(e.to_string());
            }
        }
        self.counts = self.catalog.tab_counts(&self.rules).unwrap_or_default();
        self.list.set_len(self.visible.len());
    }

    /// Items of the current view in catalog order
    pub fn visible_items(&self) -> impl Iterator<Item = &MovieItem> + '_ {
        self.visible.iter().filter_map(|&i| self.catalog.items().get(i))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_item(&self) -> Option<&MovieItem> {
        self.visible
            .get(self.list.selected)
            .and_then(|&i| self.catalog.items().get(i))
    }

    /// Item shown in the watch view
    pub fn watch_item(&self) -> Option<&MovieItem> {
        self.watch
            .as_ref()
            .and_then(|w| self.item_by_source(&w.source_id))
    }

    pub fn tab_counts(&self) -> &[TabCount] {
        &self.counts
    }

    // -------------------------------------------------------------------------
    // Tabs
    // -------------------------------------------------------------------------

    pub fn switch_tab(&mut self, tab: TabId) {
        if self.tab != tab {
            self.tab = tab;
            self.list.reset();
            self.refresh_view();
        }
    }

    pub fn next_tab(&mut self) {
        let next = (self.tab.index() + 1) % TAB_CONFIG.len();
        self.switch_tab(TAB_CONFIG[next].id);
    }

    pub fn prev_tab(&mut self) {
        let prev = (self.tab.index() + TAB_CONFIG.len() - 1) % TAB_CONFIG.len();
        self.switch_tab(TAB_CONFIG[prev].id);
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Navigate to a new state, pushing current to stack
    pub fn navigate(&mut self, state: AppState) {
        if self.state != state {
            self.nav_stack.push(self.state);
            self.state = state;
        }
        self.input_mode = InputMode::Normal;
    }

    /// Go back one step
    pub fn back(&mut self) -> bool {
        // If in editing mode, exit editing first
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
            return true;
        }

        if self.state == AppState::Watch {
            let is_series = self.watch_item().map(|i| i.is_series).unwrap_or(false);
            if let Some(watch) = self.watch.as_mut() {
                if watch.focus_back(is_series) {
                    return true;
                }
            }
        }

        if let Some(prev) = self.nav_stack.pop() {
            if prev == AppState::Browse {
                self.watch = None;
            }
            self.state = prev;
            true
        } else if self.search.is_active() {
            self.search.clear();
            self.list.reset();
            self.refresh_view();
            true
        } else {
            false
        }
    }

    /// Open the watch view for the selected item
    pub fn open_watch(&mut self) -> bool {
        let Some(item) = self.selected_item() else {
            return false;
        };
        self.watch = Some(WatchState::new(item));
        self.navigate(AppState::Watch);
        true
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    pub fn focus_search(&mut self) {
        if self.state == AppState::Browse {
            self.input_mode = InputMode::Editing;
            self.search.cursor_end();
        }
    }

    /// Take the pending play request, if any
    pub fn take_play_request(&mut self) -> Option<PlayRequest> {
        self.pending_play.take()
    }

    /// Take the pending reload request
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returns true if event was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Clear messages on any keypress
        self.error = None;
        self.status = None;

        // Global quit shortcut
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        if self.input_mode == InputMode::Editing {
            self.handle_editing_key(key)
        } else {
            self.handle_normal_key(key)
        }
    }

    /// Handle keys in editing (text input) mode; the view filters as you type
    fn handle_editing_key(&mut self, key: KeyEvent) -> bool {
        let changed = match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return true;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.clear();
                true
            }
            KeyCode::Char(c) => {
                self.search.insert(c);
                true
            }
            KeyCode::Backspace => {
                self.search.backspace();
                true
            }
            KeyCode::Delete => {
                self.search.delete();
                true
            }
            KeyCode::Left => {
                self.search.cursor_left();
                false
            }
            KeyCode::Right => {
                self.search.cursor_right();
                false
            }
            KeyCode::Home => {
                self.search.cursor_home();
                false
            }
            KeyCode::End => {
                self.search.cursor_end();
                false
            }
            _ => return false,
        };

        if changed {
            self.list.reset();
            self.refresh_view();
        }
        true
    }

    /// Handle keys in normal navigation mode
    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                return self.back();
            }
            KeyCode::Char('r') => {
                self.reload_requested = true;
                return true;
            }
            _ => {}
        }

        match self.state {
            AppState::Browse => self.handle_browse_key(key),
            AppState::Watch => self.handle_watch_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.focus_search();
                true
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.next_tab();
                true
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.prev_tab();
                true
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                match TAB_CONFIG.get(index) {
                    Some(tab) => {
                        self.switch_tab(tab.id);
                        true
                    }
                    None => false,
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.up();
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.down();
                true
            }
            KeyCode::PageUp => {
                self.list.page_up(10);
                true
            }
            KeyCode::PageDown => {
                self.list.page_down(10);
                true
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.list.first();
                true
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.list.last();
                true
            }
            KeyCode::Enter => self.open_watch(),
            _ => false,
        }
    }

    fn handle_watch_key(&mut self, key: KeyEvent) -> bool {
        let Some(item) = self.watch_item().cloned() else {
            return self.back();
        };
        let Some(watch) = self.watch.as_mut() else {
            return false;
        };

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                watch.focused_list().up();
                watch.sync_lengths(&item);
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                watch.focused_list().down();
                watch.sync_lengths(&item);
                true
            }
            KeyCode::Home | KeyCode::Char('g') => {
                watch.focused_list().first();
                watch.sync_lengths(&item);
                true
            }
            KeyCode::End | KeyCode::Char('G') => {
                watch.focused_list().last();
                watch.sync_lengths(&item);
                true
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let focus = watch.focus;
                match focus {
                    WatchFocus::Seasons if watch.seasons.len > 0 => {
                        watch.focus = WatchFocus::Episodes;
                        watch.episodes.reset();
                        watch.sync_lengths(&item);
                    }
                    WatchFocus::Episodes if watch.episodes.len > 0 => {
                        watch.focus = WatchFocus::Links;
                        watch.links.reset();
                        watch.sync_lengths(&item);
                    }
                    WatchFocus::Links if key.code == KeyCode::Enter => {
                        self.request_play(&item);
                    }
                    _ => {}
                }
                true
            }
            KeyCode::Left | KeyCode::Char('h') => self.back(),
            _ => false,
        }
    }

    fn request_play(&mut self, item: &MovieItem) {
        let Some(watch) = self.watch.as_ref() else {
            return;
        };
        let links = watch.links_of(item);
        let Some(link) = links.get(watch.links.selected) else {
            self.set_error("No playable link");
            return;
        };

        let title = match item.primary_content() {
            PrimaryContent::Seasons(seasons) => seasons
                .get(watch.seasons.selected)
                .and_then(|s| s.episodes.get(watch.episodes.selected))
                .map(|e| format!("{} - {}", item.title(), e.title))
                .unwrap_or_else(|| item.title().to_string()),
            PrimaryContent::Links(_) => item.title().to_string(),
        };

        self.pending_play = Some(PlayRequest {
            url: link.url.clone(),
            title,
        });
    }
}

/// Positions of `view` within `all`. `view` must be an order-preserving
/// subsequence of `all`.
fn positions(all: &[MovieItem], view: &[&MovieItem]) -> Vec<usize> {
    let mut out = Vec::with_capacity(view.len());
    let mut candidates = all.iter().enumerate();
    for wanted in view {
        for (i, item) in candidates.by_ref() {
            if std::ptr::eq(item, *wanted) {
                out.push(i);
                break;
            }
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn catalog() -> Catalog {
        Catalog::from_tree(&json!({
            "a1": {"title": "Blade Runner", "category": "movies",
                   "links": [{"url": "https://cdn.example/br.mp4", "label": "1080p"}]},
            "a2": {"title": "Attack on Titan", "category": "anime", "isSeries": true,
                   "seasons": [{"name": "Season 1", "episodes": [
                       {"title": "To You, in 2000 Years", "url": "https://cdn.example/aot1.mp4"},
                       {"title": "That Day", "links": [
                           {"url": "https://cdn.example/aot2a.mp4", "label": "SD"},
                           {"url": "https://cdn.example/aot2b.mp4", "label": "HD"}]}
                   ]}]},
            "a3": {"title": "Restricted X", "category": "movies", "adult": true},
            "a4": {"title": "Breaking Bad", "category": "tvshow", "isSeries": true}
        }))
    }

    fn sample_app() -> App {
        let mut app = App::new(TabRules::default());
        app.set_catalog(catalog());
        app
    }

    fn titles(app: &App) -> Vec<&str> {
        app.visible_items().map(|i| i.title()).collect()
    }

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::new(10);
        list.down();
        list.down();
        assert_eq!(list.selected, 2);
        list.up();
        assert_eq!(list.selected, 1);
        list.page_down(5);
        assert_eq!(list.selected, 6);
        list.page_down(50);
        assert_eq!(list.selected, 9);
        list.page_up(50);
        assert_eq!(list.selected, 0);
        list.last();
        assert_eq!(list.selected, 9);
        list.first();
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_list_state_empty_and_set_len() {
        let mut list = ListState::new(0);
        list.down();
        list.last();
        assert_eq!(list.selected, 0);

        let mut list = ListState::new(10);
        list.last();
        list.set_len(5);
        assert_eq!(list.selected, 4);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_scroll_into_view() {
        let mut list = ListState::new(20);
        list.selected = 12;
        list.scroll_into_view(5);
        assert_eq!(list.offset, 8);
        list.selected = 3;
        list.scroll_into_view(5);
        assert_eq!(list.offset, 3);
    }

    #[test]
    fn test_search_state_unicode_editing() {
        let mut search = SearchState::default();
        for c in "amélie".chars() {
            search.insert(c);
        }
        assert_eq!(search.cursor, 6);
        search.cursor_left();
        search.cursor_left();
        search.cursor_left();
        search.backspace();
        assert_eq!(search.query, "amlie");
        search.insert('é');
        search.delete();
        assert_eq!(search.query, "améie");
        search.clear();
        assert!(!search.is_active());
    }

    #[test]
    fn test_home_tab_lists_non_adult_items() {
        let app = sample_app();
        assert_eq!(app.tab, TabId::Home);
        assert_eq!(titles(&app), ["Blade Runner", "Attack on Titan", "Breaking Bad"]);
    }

    #[test]
    fn test_tab_switching_keys() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.tab, TabId::Anime);
        assert_eq!(titles(&app), ["Attack on Titan"]);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tab, TabId::Adult);
        assert_eq!(titles(&app), ["Restricted X"]);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tab, TabId::Home);

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.tab, TabId::Adult);
    }

    #[test]
    fn test_typing_filters_live() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Editing);
        for c in "AD".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(titles(&app), ["Blade Runner", "Breaking Bad"]);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);

        // Query survives tab switches
        app.switch_tab(TabId::Movies);
        assert_eq!(titles(&app), ["Blade Runner"]);
    }

    #[test]
    fn test_escape_from_editing_first_then_clears_query() {
        let mut app = sample_app();
        app.focus_search();
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search.query, "x");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.search.query, "");
        assert_eq!(app.visible_len(), 3);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);

        let mut app = sample_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn test_movie_watch_plays_selected_link() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Watch);
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Links);

        app.handle_key(key(KeyCode::Enter));
        let play = app.take_play_request().unwrap();
        assert_eq!(play.url, "https://cdn.example/br.mp4");
        assert_eq!(play.title, "Blade Runner");
        assert!(app.take_play_request().is_none());

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Browse);
        assert!(app.watch.is_none());
    }

    #[test]
    fn test_series_watch_walks_seasons_episodes_links() {
        let mut app = sample_app();
        app.switch_tab(TabId::Anime);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Seasons);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Episodes);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        let watch = app.watch.as_ref().unwrap();
        assert_eq!(watch.focus, WatchFocus::Links);
        assert_eq!(watch.links.len, 2);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        let play = app.take_play_request().unwrap();
        assert_eq!(play.url, "https://cdn.example/aot2b.mp4");
        assert_eq!(play.title, "Attack on Titan - That Day");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Episodes);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Seasons);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Browse);
    }

    #[test]
    fn test_series_without_seasons_has_nothing_to_play() {
        let mut app = sample_app();
        app.switch_tab(TabId::TvShow);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.watch.as_ref().unwrap().focus, WatchFocus::Seasons);
        assert!(app.take_play_request().is_none());
    }

    #[test]
    fn test_set_catalog_keeps_selection_by_store_key() {
        let mut app = sample_app();
        app.list.selected = 2;
        assert_eq!(app.selected_item().unwrap().title(), "Breaking Bad");

        let mut tree = json!({
            "a0": {"title": "Alien", "category": "movies"}
        });
        for (k, v) in catalog().items().iter().map(|i| (i.source_id.clone(), i.raw.clone())) {
            tree[k] = serde_json::Value::Object(v);
        }
        app.set_catalog(Catalog::from_tree(&tree));
        assert_eq!(app.selected_item().unwrap().title(), "Breaking Bad");
    }

    #[test]
    fn test_removed_item_closes_watch_view() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Watch);

        app.set_catalog(Catalog::from_tree(&json!({
            "a2": {"title": "Attack on Titan", "category": "anime"}
        })));
        assert_eq!(app.state, AppState::Browse);
        assert!(app.watch.is_none());
        assert!(app.error.is_some());
    }

    #[test]
    fn test_tab_counts_follow_catalog() {
        let app = sample_app();
        let counts: Vec<usize> = app.tab_counts().iter().map(|c| c.count).collect();
        assert_eq!(counts, [3, 1, 1, 1, 1]);
    }

    #[test]
    fn test_reload_request() {
        let mut app = sample_app();
        assert!(!app.take_reload_request());
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.take_reload_request());
        assert!(!app.take_reload_request());
    }

    #[test]
    fn test_loading_state() {
        let loading = LoadingState::Loading(Some("Fetching catalog...".into()));
        assert!(loading.is_loading());
        assert_eq!(loading.message(), Some("Fetching catalog..."));
        let error = LoadingState::Error("boom".into());
        assert!(error.is_error());
        assert_eq!(LoadingState::default().message(), None);
    }

    #[test]
    fn test_positions_of_subsequence() {
        let catalog = catalog();
        let items = catalog.items();
        let view = vec![&items[1], &items[3]];
        assert_eq!(positions(items, &view), [1, 3]);
        assert!(positions(items, &[]).is_empty());
    }
}
