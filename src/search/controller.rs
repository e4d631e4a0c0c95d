//! Search-as-you-type state machine behind the site search popup.
//!
//! Keystrokes go through [`SearchController::on_query_change`]. A non-empty
//! query arms a debounce timer; a newer keystroke aborts the timer and arms a
//! fresh one. When the timer fires the lookup runs as its own task, so
//! cancelling the timer never interrupts a lookup already in flight. Every
//! query change bumps a generation counter and a finished lookup only lands
//! if its generation is still current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::models::SearchResult;
use crate::repository::SearchSource;
use crate::search::{post_result, report_result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Default)]
struct SearchState {
    open: bool,
    query: String,
    results: Vec<SearchResult>,
    active_index: usize,
    loading: bool,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl SearchState {
    /// Drop results and invalidate anything still running
    fn reset(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
        self.generation += 1;
        self.query.clear();
        self.results.clear();
        self.active_index = 0;
        self.loading = false;
    }
}

/// Cloning yields another handle onto the same popup state.
#[derive(Clone)]
pub struct SearchController {
    source: Arc<dyn SearchSource>,
    config: SearchConfig,
    runtime: Option<Handle>,
    state: Arc<Mutex<SearchState>>,
}

impl SearchController {
    /// Lookups run on the tokio runtime current at construction, if any.
    pub fn new(source: Arc<dyn SearchSource>, config: SearchConfig) -> Self {
        Self::with_runtime(source, config, Handle::try_current().ok())
    }

    pub fn with_runtime(source: Arc<dyn SearchSource>, config: SearchConfig, runtime: Option<Handle>) -> Self {
        Self {
            source,
            config,
            runtime,
            state: Arc::new(Mutex::new(SearchState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) {
        let mut state = self.lock();
        state.reset();
        state.open = true;
    }

    pub fn close(&self) {
        let mut state = self.lock();
        state.reset();
        state.open = false;
    }

    pub fn on_query_change(&self, text: &str) {
        let mut state = self.lock();
        if let Some(timer) = state.pending.take() {
            timer.abort();
        }
        state.generation += 1;
        state.query = text.to_string();

        let term = text.trim();
        if term.is_empty() {
            state.results.clear();
            state.active_index = 0;
            state.loading = false;
            return;
        }

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            log::error!("No tokio runtime available, search for {:?} skipped", term);
            state.loading = false;
            return;
        };

        state.loading = true;
        let generation = state.generation;
        let term = term.to_string();
        let deadline = Instant::now() + self.config.debounce();
        let controller = self.clone();
        let lookup_runtime = runtime.clone();

        state.pending = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            lookup_runtime.spawn(async move {
                controller.run_lookup(generation, term).await;
            });
        }));
    }

    async fn run_lookup(&self, generation: u64, term: String) {
        let limit = self.config.max_results_per_source;
        log::debug!("Searching posts and reports for {:?}", term);

        let (posts, reports) = futures::join!(
            self.source.search_posts(&term, limit),
            self.source.search_reports(&term, limit),
        );

        let mut results = Vec::new();
        match posts {
            Ok(hits) => results.extend(hits.iter().map(post_result)),
            Err(e) => log::warn!("Post search failed for {:?}: {}", term, e),
        }
        match reports {
            Ok(hits) => results.extend(hits.iter().map(report_result)),
            Err(e) => log::warn!("Report search failed for {:?}: {}", term, e),
        }

        let mut state = self.lock();
        if state.generation != generation {
            log::debug!("Discarding stale results for {:?}", term);
            return;
        }
        state.results = results;
        state.active_index = 0;
        state.loading = false;
        state.pending = None;
    }

    pub fn on_key_navigate(&self, direction: Direction) {
        let mut state = self.lock();
        let last = state.results.len().saturating_sub(1);
        state.active_index = match direction {
            Direction::Down => (state.active_index + 1).min(last),
            Direction::Up => state.active_index.saturating_sub(1),
        };
    }

    /// Target URL of the highlighted result; closes the popup when there is one
    pub fn on_select(&self) -> Option<String> {
        let mut state = self.lock();
        let url = state
            .results
            .get(state.active_index)
            .map(|r| r.target_url.clone())?;
        state.reset();
        state.open = false;
        Some(url)
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.lock().results.clone()
    }

    pub fn active_index(&self) -> usize {
        self.lock().active_index
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn query(&self) -> String {
        self.lock().query.clone()
    }
}
