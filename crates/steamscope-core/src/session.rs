//! Cursor-based pagination over one app's reviews.
//!
//! A session owns its cursor and its [`SeenIds`]; nothing is shared between
//! sessions, so two sessions over the same app may emit the same review.

use steamscope_config::{ReviewOrder, ScrapeConfig};
use steamscope_models::{ReviewRecord, TimeWindow};
use steamscope_sources::{PageQuery, ReviewPageSource, SourceError};
use tracing::{debug, info, warn};
use crate::filter::{ReviewPredicate, SeenIds};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub window: TimeWindow,
    pub language: String,
    pub num_per_page: u32,
    pub order: ReviewOrder,
    /// Upper bound on requests issued by one session.
    pub max_pages: Option<u32>,
    /// Upper bound on accepted reviews; the output is truncated to it.
    pub max_reviews: Option<usize>,
    /// Stop when a whole page yields no identifier not seen before.
    pub stop_on_stale_page: bool,
}

impl SessionOptions {
    /// Batch scraper profile: configured window and page cap.
    pub fn batch(config: &ScrapeConfig, window: TimeWindow) -> Self {
        Self {
            window,
            language: config.language.clone(),
            num_per_page: config.num_per_page,
            order: config.order,
            max_pages: Some(config.max_pages),
            max_reviews: None,
            stop_on_stale_page: false,
        }
    }

    /// On-demand API profile: newest reviews first, capped by count and
    /// pages.
    pub fn on_demand(max_reviews: usize, max_pages: u32) -> Self {
        Self {
            window: TimeWindow::unbounded(),
            language: "english".to_string(),
            num_per_page: 100,
            order: ReviewOrder::Recent,
            max_pages: Some(max_pages),
            max_reviews: Some(max_reviews),
            stop_on_stale_page: true,
        }
    }

    fn first_query(&self) -> PageQuery {
        PageQuery::first_page(self.language.clone(), self.num_per_page, self.order)
    }
}

/// Why a session stopped.
#[derive(Debug)]
pub enum Termination {
    /// The last page carried no next cursor.
    CursorExhausted,
    /// Upstream returned a page with no reviews.
    EmptyPage,
    /// A review older than the window start was reached.
    StartBoundaryPassed,
    PageLimit,
    ReviewLimit,
    /// A whole page contained only already-seen identifiers.
    StalePage,
    Failed(SourceError),
}

impl Termination {
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Termination::CursorExhausted => "cursor_exhausted",
            Termination::EmptyPage => "empty_page",
            Termination::StartBoundaryPassed => "start_boundary_passed",
            Termination::PageLimit => "page_limit",
            Termination::ReviewLimit => "review_limit",
            Termination::StalePage => "stale_page",
            Termination::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub appid: u32,
    pub reviews: Vec<ReviewRecord>,
    pub termination: Termination,
    pub pages_fetched: u32,
    /// Reviews dropped by the quality predicate.
    pub rejected: usize,
    /// Reviews dropped because their identifier was already emitted.
    pub duplicates: usize,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        !self.termination.is_failure()
    }
}

/// One pagination run for a single app.
pub struct ReviewSession<'a> {
    source: &'a dyn ReviewPageSource,
    predicate: &'a dyn ReviewPredicate,
    options: &'a SessionOptions,
}

impl<'a> ReviewSession<'a> {
    pub fn new(
        source: &'a dyn ReviewPageSource,
        predicate: &'a dyn ReviewPredicate,
        options: &'a SessionOptions,
    ) -> Self {
        Self { source, predicate, options }
    }

    /// Run to completion. Never returns an error: a failed request ends the
    /// session with [`Termination::Failed`] and keeps what was accumulated.
    pub async fn run(&self, appid: u32) -> SessionOutcome {
        let window = self.options.window;
        let mut query = self.options.first_query();
        let mut seen = SeenIds::new();
        let mut reviews = Vec::new();
        let mut passed_end = false;
        let mut pages_fetched = 0u32;
        let mut rejected = 0usize;
        let mut duplicates = 0usize;

        let termination = 'pages: loop {
            if let Some(max_pages) = self.options.max_pages {
                if pages_fetched >= max_pages {
                    debug!("App {}: page limit {} reached", appid, max_pages);
                    break Termination::PageLimit;
                }
            }

            let page = match self.source.fetch_page(appid, &query).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("App {}: request for page {} failed: {}", appid, pages_fetched + 1, e);
                    break Termination::Failed(e);
                }
            };
            pages_fetched += 1;

            if !page.is_success() {
                warn!("App {}: upstream reported success={}", appid, page.success);
                break Termination::Failed(SourceError::Upstream(page.success));
            }

            if page.is_empty() {
                debug!("App {}: no reviews on page {}", appid, pages_fetched);
                break Termination::EmptyPage;
            }

            let mut novel_on_page = 0usize;
            for raw in &page.reviews {
                let created = raw.timestamp_created;

                // Newer than the window: skip without touching the boundary state
                if window.is_after_end(created) {
                    continue;
                }
                if !passed_end {
                    passed_end = true;
                    debug!("App {}: passed end boundary at review {}", appid, raw.recommendationid);
                }

                if window.is_before_start(created) {
                    debug!("App {}: passed start boundary at review {}", appid, raw.recommendationid);
                    break 'pages Termination::StartBoundaryPassed;
                }

                if !seen.insert(&raw.recommendationid) {
                    duplicates += 1;
                    continue;
                }
                novel_on_page += 1;

                if !self.predicate.accepts(raw) {
                    debug!("App {}: review {} rejected by {}", appid, raw.recommendationid, self.predicate.name());
                    rejected += 1;
                    continue;
                }

                reviews.push(ReviewRecord::from_raw(raw));
                if let Some(max_reviews) = self.options.max_reviews {
                    if reviews.len() >= max_reviews {
                        break 'pages Termination::ReviewLimit;
                    }
                }
            }

            if self.options.stop_on_stale_page && novel_on_page == 0 {
                debug!("App {}: page {} had no new reviews", appid, pages_fetched);
                break Termination::StalePage;
            }

            match page.next_cursor() {
                Some(cursor) => {
                    debug!("App {}: next page cursor {}", appid, cursor);
                    query = query.with_cursor(cursor);
                }
                None => {
                    debug!("App {}: reached the end of all reviews", appid);
                    break Termination::CursorExhausted;
                }
            }
        };

        if let Some(max_reviews) = self.options.max_reviews {
            reviews.truncate(max_reviews);
        }

        info!(
            "App {}: session ended ({}) after {} pages with {} reviews ({} rejected, {} duplicates)",
            appid,
            termination.label(),
            pages_fetched,
            reviews.len(),
            rejected,
            duplicates
        );

        SessionOutcome {
            appid,
            reviews,
            termination,
            pages_fetched,
            rejected,
            duplicates,
        }
    }
}
