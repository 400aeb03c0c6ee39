// src/app/discovery.rs
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::app::catalog::CatalogClient;
use crate::app::pager::sanitize_page;
use crate::app::trending::PopularityAggregator;
use crate::app::types::{FetchDone, FetchMode, FetchRequest, FetchState};

/// What applying one completion did to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Belonged to a superseded request; dropped.
    Stale,
    Failed,
    Loaded { total_pages: u32 },
}

/// Owns `FetchState` and the generation counter. Every (query, page) change
/// starts a new generation; only the newest generation may write state.
pub struct Discovery {
    client: Arc<dyn CatalogClient>,
    aggregator: Option<Arc<PopularityAggregator>>,
    state: FetchState,
    generation: u64,
    current: Option<FetchRequest>,
    in_flight: bool,
    page_transition: bool,
    done_tx: Sender<FetchDone>,
    done_rx: Receiver<FetchDone>,
    record_jobs: Vec<JoinHandle<()>>,
}

impl Discovery {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        aggregator: Option<Arc<PopularityAggregator>>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel::<FetchDone>();
        Self {
            client,
            aggregator,
            state: FetchState::Idle,
            generation: 0,
            current: None,
            in_flight: false,
            page_transition: false,
            done_tx,
            done_rx,
            record_jobs: Vec::new(),
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_request(&self) -> Option<&FetchRequest> {
        self.current.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn page_transition(&self) -> bool {
        self.page_transition
    }

    pub fn mark_page_transition(&mut self) {
        self.page_transition = true;
    }

    /// Start a fetch for (query, page) unless that exact pair is already the
    /// current request. Returns the dispatched request.
    pub fn trigger(&mut self, query: &str, page: u32) -> Option<FetchRequest> {
        let page = sanitize_page(i64::from(page));
        if let Some(cur) = &self.current {
            if cur.query == query && cur.page == page {
                debug!("fetch for {query:?} page {page} already current; skipping");
                return None;
            }
        }
        let request = self.begin(query, page);
        self.dispatch(request.clone());
        Some(request)
    }

    /// Enter `Loading` and mint the request descriptor for a new generation.
    pub fn begin(&mut self, query: &str, page: u32) -> FetchRequest {
        self.generation += 1;
        let request = FetchRequest {
            generation: self.generation,
            mode: FetchMode::for_query(query),
            query: query.to_string(),
            page: sanitize_page(i64::from(page)),
        };
        self.state = FetchState::Loading;
        self.current = Some(request.clone());
        self.in_flight = true;
        info!(
            "fetch #{} {} {:?} page {}",
            request.generation,
            request.mode.as_str(),
            request.query,
            request.page
        );
        request
    }

    fn dispatch(&self, request: FetchRequest) {
        let client = Arc::clone(&self.client);
        let done_tx = self.done_tx.clone();
        std::thread::spawn(move || {
            let result = client.fetch_page(&request);
            let _ = done_tx.send(FetchDone {
                generation: request.generation,
                result,
            });
        });
    }

    /// Apply one completion. Anything but the newest generation is ignored.
    pub fn apply(&mut self, done: FetchDone) -> FetchOutcome {
        if done.generation != self.generation {
            debug!(
                "dropping stale response #{} (current #{})",
                done.generation, self.generation
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = false;
        self.page_transition = false;

        match done.result {
            Err(err) => {
                warn!("fetch #{} failed: {err}", done.generation);
                self.state = FetchState::Failed(err.user_message());
                FetchOutcome::Failed
            }
            Ok(page) => {
                let total_pages = page.total_pages;
                if let (Some(req), Some(top)) = (&self.current, page.results.first()) {
                    if req.mode == FetchMode::Search {
                        if let Some(agg) = &self.aggregator {
                            self.record_jobs.retain(|h| !h.is_finished());
                            self.record_jobs
                                .push(agg.spawn_record(req.query.clone(), top.clone()));
                        }
                    }
                }
                debug!(
                    "fetch #{} loaded {} movies ({} pages)",
                    done.generation,
                    page.results.len(),
                    total_pages
                );
                self.state = FetchState::Success {
                    movies: page.results,
                    total_pages,
                };
                FetchOutcome::Loaded { total_pages }
            }
        }
    }

    /// Drain finished fetches without blocking.
    pub fn poll(&mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.done_rx.try_recv() {
                Ok(done) => outcomes.push(self.apply(done)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        outcomes
    }

    /// Block until detached trending writes have landed.
    pub fn flush_records(&mut self) {
        for handle in self.record_jobs.drain(..) {
            if handle.join().is_err() {
                warn!("trending record worker panicked");
            }
        }
    }
}
