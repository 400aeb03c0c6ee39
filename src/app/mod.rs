// src/app/mod.rs - debounced search + paged catalog fetch + trending side channel

// ---- Standard lib imports ----
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---- Crates ----
use tracing::{debug, info};

// ---- Local modules ----
pub mod catalog;
pub mod debounce;
pub mod detail;
pub mod discovery;
pub mod pager;
pub mod prefs;
pub mod trending;
pub mod types;
pub mod utils;

pub use catalog::{CatalogClient, CatalogError, TmdbClient};
pub use debounce::Debouncer;
pub use detail::DetailLoader;
pub use discovery::{Discovery, FetchOutcome};
pub use pager::{parse_page, sanitize_page, Pager, MAX_CATALOG_PAGE};
pub use prefs::SessionPrefs;
pub use trending::{PopularityAggregator, PopularityStore, SqliteTrendingStore, TrendingError};
pub use types::*;

use crate::config::AppConfig;

/// Which navigation button was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageNav {
    First,
    Previous,
    Next,
    Last,
    To(i64),
}

/// The whole browsing session: search box, pager, results, trending panel
/// and the open detail view. Driven by `tick`, never blocks.
pub struct DiscoveryApp {
    // search box
    search_term: String,
    stable_query: String,
    debouncer: Debouncer,

    // results
    pager: Pager,
    discovery: Discovery,

    // trending panel
    aggregator: Arc<PopularityAggregator>,
    trending: Vec<TrendingEntry>,
    trending_limit: usize,
    trending_rx: Option<Receiver<Vec<TrendingEntry>>>,

    // detail view
    details: DetailLoader,

    did_init: bool,
}

impl DiscoveryApp {
    pub fn new(
        cfg: &AppConfig,
        client: Arc<dyn CatalogClient>,
        store: Arc<dyn PopularityStore>,
        prefs: SessionPrefs,
    ) -> Self {
        let aggregator = Arc::new(PopularityAggregator::new(store, cfg.image_base_url.clone()));
        Self {
            search_term: String::new(),
            stable_query: String::new(),
            debouncer: Debouncer::new(Duration::from_millis(cfg.debounce_ms)),
            pager: Pager::new(prefs),
            discovery: Discovery::new(Arc::clone(&client), Some(Arc::clone(&aggregator))),
            aggregator,
            trending: Vec::new(),
            trending_limit: cfg.trending_limit,
            trending_rx: None,
            details: DetailLoader::new(client),
            did_init: false,
        }
    }

    /// First fetch (browse mode at the remembered page) plus the trending list.
    pub fn start(&mut self) {
        if self.did_init {
            return;
        }
        self.did_init = true;
        info!(
            "starting discovery at page {}{}",
            self.pager.current(),
            if self.pager.has_remembered_page() { " (remembered)" } else { "" }
        );
        self.discovery.trigger(&self.stable_query, self.pager.current());
        self.refresh_trending();
    }

    // ---- inputs ----
    /// One keystroke's worth of search-box text.
    pub fn set_search_term(&mut self, raw: impl Into<String>, now: Instant) {
        self.search_term = raw.into();
        self.debouncer.push(self.search_term.clone(), now);
    }

    /// Returns whether the page change was accepted.
    pub fn navigate(&mut self, nav: PageNav) -> bool {
        let busy = self.discovery.is_busy();
        let accepted = match nav {
            PageNav::First => self.pager.first(busy),
            PageNav::Previous => self.pager.previous(busy),
            PageNav::Next => self.pager.next(busy),
            PageNav::Last => self.pager.last(busy),
            PageNav::To(n) => self.pager.go_to(n, busy),
        };
        if accepted {
            self.discovery.mark_page_transition();
            self.discovery.trigger(&self.stable_query, self.pager.current());
        } else {
            debug!("navigation {nav:?} ignored (busy={busy})");
        }
        accepted
    }

    pub fn open_details(&mut self, movie_id: u64) {
        self.details.load(movie_id);
    }

    pub fn close_details(&mut self) {
        self.details.clear();
    }

    pub fn refresh_trending(&mut self) {
        let (tx, rx) = mpsc::channel::<Vec<TrendingEntry>>();
        self.trending_rx = Some(rx);
        let aggregator = Arc::clone(&self.aggregator);
        let limit = self.trending_limit;
        std::thread::spawn(move || {
            let _ = tx.send(aggregator.top_n(limit));
        });
    }

    // ---- event loop ----
    /// Advance timers and drain worker results. Returns true when anything
    /// visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(query) = self.debouncer.poll(now) {
            self.on_stable_query(query);
            changed = true;
        }

        for outcome in self.discovery.poll() {
            match outcome {
                FetchOutcome::Stale => {}
                FetchOutcome::Failed => changed = true,
                FetchOutcome::Loaded { total_pages } => {
                    changed = true;
                    if self.pager.set_total_pages(total_pages) {
                        self.discovery.trigger(&self.stable_query, self.pager.current());
                    }
                }
            }
        }

        changed |= self.details.poll();
        changed |= self.poll_trending();
        changed
    }

    fn on_stable_query(&mut self, query: String) {
        if query != self.stable_query && !self.pager.has_remembered_page() {
            self.pager.reset_to_first();
        }
        self.stable_query = query;
        self.discovery.trigger(&self.stable_query, self.pager.current());
    }

    fn poll_trending(&mut self) -> bool {
        let Some(rx) = &self.trending_rx else {
            return false;
        };
        match rx.try_recv() {
            Ok(entries) => {
                self.trending = entries;
                self.trending_rx = None;
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.trending_rx = None;
                false
            }
        }
    }

    /// Wait for detached trending writes before exit.
    pub fn shutdown(&mut self) {
        self.discovery.flush_records();
    }

    // ---- views ----
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn stable_query(&self) -> &str {
        &self.stable_query
    }

    pub fn debounce_pending(&self) -> bool {
        self.debouncer.pending()
    }

    pub fn fetch_state(&self) -> &FetchState {
        self.discovery.state()
    }

    pub fn is_loading(&self) -> bool {
        self.discovery.is_busy()
    }

    pub fn is_page_transitioning(&self) -> bool {
        self.discovery.page_transition()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn current_request(&self) -> Option<&FetchRequest> {
        self.discovery.current_request()
    }

    pub fn trending(&self) -> &[TrendingEntry] {
        &self.trending
    }

    pub fn detail_state(&self) -> &DetailState {
        self.details.state()
    }
}
