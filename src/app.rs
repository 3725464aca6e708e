use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::context::Context;
use crate::error::Result;
use crate::models::{HackerNewsItem, ItemType};
use crate::pipeline::FetchPipeline;

/// One line of user input in the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NextPage,
    NextTab,
    PreviousTab,
    /// Open story `N` (1-based, as numbered on screen)
    Open(usize),
    Filter(Option<String>),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if let Some(query) = line.strip_prefix('/') {
            let query = query.trim();
            return Some(Command::Filter(
                (!query.is_empty()).then(|| query.to_string()),
            ));
        }

        let mut parts = line.split_whitespace();
        let command = match parts.next()? {
            "n" => Command::NextPage,
            "t" | "tab" => Command::NextTab,
            "T" => Command::PreviousTab,
            "o" | "open" => Command::Open(parts.next()?.parse().ok()?),
            "h" | "?" | "help" => Command::Help,
            "q" | "quit" => Command::Quit,
            number => Command::Open(number.parse().ok()?),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
n        fetch next page
t / T    next / previous tab
o <N>    open story N in the browser
/ <text> filter by title, `/` alone clears
q        quit";

struct Tab {
    kind: ItemType,
    items: Vec<HackerNewsItem>,
    pages_loaded: usize,
}

pub struct App {
    ctx: Context,
    pipeline: FetchPipeline,
    per_page: usize,
    ids: Vec<Vec<u64>>,
    tabs: Vec<Tab>,
    active_tab: usize,
    search_query: Option<String>,
}

impl App {
    /// Fetches the story ID lists for every tab. Fails if any list cannot be loaded.
    pub fn new(ctx: Context, pipeline: FetchPipeline, per_page: usize) -> Result<Self> {
        let mut ids = Vec::with_capacity(ItemType::TABS.len());
        for kind in ItemType::TABS {
            ids.push(pipeline.service().get_items(&ctx, kind)?);
        }

        let tabs = ItemType::TABS
            .iter()
            .map(|&kind| Tab {
                kind,
                items: Vec::new(),
                pages_loaded: 0,
            })
            .collect();

        Ok(Self {
            ctx,
            pipeline,
            per_page,
            ids,
            tabs,
            active_tab: 0,
            search_query: None,
        })
    }

    /// Loads the first page of every tab that has not been loaded yet.
    pub fn load_initial(&mut self) {
        for tab in 0..self.tabs.len() {
            if self.tabs[tab].pages_loaded == 0 {
                self.load_page(tab);
            }
        }
    }

    /// Appends the next page of the active tab. Returns how many stories were added.
    pub fn next_page(&mut self) -> usize {
        self.load_page(self.active_tab)
    }

    fn load_page(&mut self, tab: usize) -> usize {
        let page = self.tabs[tab].pages_loaded;
        let items = self
            .pipeline
            .fetch_page(&self.ctx, &self.ids, tab, page, self.per_page);
        if items.is_empty() {
            return 0;
        }

        let added = items.len();
        let state = &mut self.tabs[tab];
        state.items.extend(items);
        state.pages_loaded += 1;
        info!(tab = %state.kind, page, added, "loaded page");
        added
    }

    pub fn next_tab(&mut self) {
        self.active_tab = (self.active_tab + 1).min(self.tabs.len() - 1);
    }

    pub fn previous_tab(&mut self) {
        self.active_tab = self.active_tab.saturating_sub(1);
    }

    /// Switches to the tab showing `kind`. Returns false when there is no such tab.
    pub fn select_tab(&mut self, kind: ItemType) -> bool {
        match self.tabs.iter().position(|tab| tab.kind == kind) {
            Some(index) => {
                self.active_tab = index;
                true
            }
            None => false,
        }
    }

    pub fn active_tab(&self) -> ItemType {
        self.tabs[self.active_tab].kind
    }

    pub fn set_filter(&mut self, query: Option<String>) {
        self.search_query = query.map(|q| q.to_lowercase());
    }

    pub fn has_more(&self) -> bool {
        let tab = &self.tabs[self.active_tab];
        tab.items.len() < self.ids[self.active_tab].len()
    }

    /// Stories of the active tab with their on-screen numbers, after filtering.
    pub fn visible_items(&self) -> Vec<(usize, &HackerNewsItem)> {
        self.tabs[self.active_tab]
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| match &self.search_query {
                Some(query) => item.filter_value().to_lowercase().contains(query),
                None => true,
            })
            .map(|(i, item)| (i + 1, item))
            .collect()
    }

    /// Marks story `number` visited and returns it.
    pub fn visit(&mut self, number: usize) -> Option<&HackerNewsItem> {
        let item = self.tabs[self.active_tab]
            .items
            .get_mut(number.checked_sub(1)?)?;
        item.visited = true;
        Some(item)
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut out = String::from("HN Reader |");
        for (i, tab) in self.tabs.iter().enumerate() {
            if i == self.active_tab {
                let _ = write!(out, " [{}]", tab.kind.title());
            } else {
                let _ = write!(out, " {}", tab.kind.title());
            }
        }
        out.push('\n');
        if let Some(query) = &self.search_query {
            let _ = writeln!(out, "filter: {}", query);
        }
        out.push('\n');

        for (number, item) in self.visible_items() {
            let marker = if item.visited { '*' } else { ' ' };
            let _ = writeln!(out, "{}{:>3}. {}", marker, number, item.display_title());
            let _ = writeln!(out, "      {}", item.description_at(now));
        }

        let tab = &self.tabs[self.active_tab];
        let _ = write!(
            out,
            "\n{} of {} stories",
            tab.items.len(),
            self.ids[self.active_tab].len()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemCache;
    use crate::hn_client::HackerNewsClient;
    use crate::test_helpers::{FakeRemote, FakeService};
    use std::sync::Arc;

    fn app(per_page: usize) -> (App, Arc<FakeRemote>) {
        let remote = Arc::new(
            FakeRemote::new()
                .with_body("topstories.json", "[1, 2, 3, 4, 5]")
                .with_body("newstories.json", "[6, 7]")
                .with_body("beststories.json", "[1]")
                .with_body("askstories.json", "[]")
                .with_items(1..=7),
        );
        let service = HackerNewsClient::new(remote.clone(), Arc::new(MemCache::new()));
        let pipeline = FetchPipeline::new(Arc::new(service), 3);
        let app = App::new(Context::background(), pipeline, per_page).unwrap();
        (app, remote)
    }

    fn numbers(app: &App) -> Vec<usize> {
        app.visible_items().iter().map(|(n, _)| *n).collect()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("n"), Some(Command::NextPage));
        assert_eq!(Command::parse(" t "), Some(Command::NextTab));
        assert_eq!(Command::parse("T"), Some(Command::PreviousTab));
        assert_eq!(Command::parse("o 4"), Some(Command::Open(4)));
        assert_eq!(Command::parse("12"), Some(Command::Open(12)));
        assert_eq!(Command::parse("/ rust"), Some(Command::Filter(Some("rust".into()))));
        assert_eq!(Command::parse("/"), Some(Command::Filter(None)));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("o"), None);
        assert_eq!(Command::parse("bogus"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn new_fails_when_a_list_cannot_load() {
        let remote = Arc::new(FakeRemote::new().with_body("topstories.json", "[]"));
        let service = HackerNewsClient::new(remote, Arc::new(MemCache::new()));
        let pipeline = FetchPipeline::new(Arc::new(service), 1);

        assert!(App::new(Context::background(), pipeline, 10).is_err());
    }

    #[test]
    fn failed_story_shows_as_placeholder_in_its_tab() {
        let service = FakeService::new()
            .with_list(ItemType::Top, vec![1, 2, 3])
            .with_items([1, 3])
            .with_failure(2, "boom");
        let pipeline = FetchPipeline::new(Arc::new(service), 2);
        let mut app = App::new(Context::background(), pipeline, 10).unwrap();
        app.load_initial();

        let titles: Vec<String> = app
            .visible_items()
            .iter()
            .map(|(_, item)| item.title.clone())
            .collect();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0], "story 1");
        assert!(titles[1].contains("boom"));
        assert_eq!(titles[2], "story 3");
    }

    #[test]
    fn initial_load_fetches_first_page_of_each_tab() {
        let (mut app, remote) = app(2);
        app.load_initial();

        assert_eq!(numbers(&app), vec![1, 2]);
        app.next_tab();
        assert_eq!(app.active_tab(), ItemType::New);
        assert_eq!(numbers(&app), vec![1, 2]);
        // 4 lists, then items 1, 2, 6, 7; item 1 again for Best is a cache hit.
        assert_eq!(remote.call_count(), 8);
    }

    #[test]
    fn paging_appends_and_stops_at_the_end() {
        let (mut app, _) = app(2);
        app.load_initial();

        assert_eq!(app.next_page(), 2);
        assert_eq!(app.next_page(), 1);
        assert!(!app.has_more());
        assert_eq!(app.next_page(), 0);

        let ids: Vec<u64> = app.visible_items().iter().map(|(_, item)| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn tab_switching_clamps() {
        let (mut app, _) = app(2);

        app.previous_tab();
        assert_eq!(app.active_tab(), ItemType::Top);
        for _ in 0..10 {
            app.next_tab();
        }
        assert_eq!(app.active_tab(), ItemType::Ask);
        assert!(app.select_tab(ItemType::Best));
        assert!(!app.select_tab(ItemType::Item));
        assert_eq!(app.active_tab(), ItemType::Best);
    }

    #[test]
    fn filter_keeps_original_numbers() {
        let (mut app, _) = app(5);
        app.load_initial();

        app.set_filter(Some("STORY 3".into()));
        assert_eq!(numbers(&app), vec![3]);
        app.set_filter(None);
        assert_eq!(numbers(&app).len(), 5);
    }

    #[test]
    fn visit_marks_item() {
        let (mut app, _) = app(2);
        app.load_initial();

        assert_eq!(app.visit(2).map(|item| item.id), Some(2));
        assert!(app.visit(0).is_none());
        assert!(app.visit(9).is_none());

        let screen = app.render(Utc::now());
        assert!(screen.contains("*  2. story 2"));
        assert!(screen.contains("   1. story 1"));
        assert!(screen.starts_with("HN Reader | [TOP] NEW BEST ASK"));
        assert!(screen.ends_with("2 of 5 stories"));
    }
}
