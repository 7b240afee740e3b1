//! Sequential batch scraping over many apps.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use steamscope_models::ReviewRecord;
use steamscope_sources::ReviewPageSource;
use tracing::warn;
use crate::export::flatten_sessions;
use crate::filter::ReviewPredicate;
use crate::progress::ProgressTracker;
use crate::session::{ReviewSession, SessionOptions, Termination};

#[derive(Debug, Error)]
#[error("invalid app id in '{input}': {source}")]
pub struct TargetParseError {
    pub input: String,
    #[source]
    pub source: std::num::ParseIntError,
}

/// A game to scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub appid: u32,
    pub title: String,
}

impl ScrapeTarget {
    pub fn new(appid: u32, title: impl Into<String>) -> Self {
        Self { appid, title: title.into() }
    }

    /// Parse `APPID` or `APPID:Title`.
    pub fn parse(spec: &str) -> Result<Self, TargetParseError> {
        let (id, title) = match spec.split_once(':') {
            Some((id, title)) => (id.trim(), title.trim().to_string()),
            None => (spec.trim(), String::new()),
        };
        let appid: u32 = id.parse().map_err(|source| TargetParseError {
            input: spec.to_string(),
            source,
        })?;
        let title = if title.is_empty() { appid.to_string() } else { title };
        Ok(Self { appid, title })
    }
}

/// Per-app line of a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct AppReport {
    pub appid: u32,
    pub title: String,
    pub reviews: usize,
    pub pages: u32,
    pub termination: &'static str,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub reviews: Vec<ReviewRecord>,
    pub apps: Vec<AppReport>,
}

impl BatchResult {
    pub fn failed_apps(&self) -> usize {
        self.apps.iter().filter(|a| a.error.is_some()).count()
    }
}

/// Scrape every target one after another. A failing app is logged and the
/// batch moves on; its partial results are kept.
///
/// `on_app_done` is called after each app with its 1-based position.
pub async fn scrape_batch<F>(
    source: &dyn ReviewPageSource,
    predicate: &dyn ReviewPredicate,
    targets: &[ScrapeTarget],
    options: &SessionOptions,
    mut on_app_done: F,
) -> BatchResult
where
    F: FnMut(usize, &AppReport),
{
    let progress_interval = if targets.len() < 100 { 10 } else { 50 };
    let mut tracker = ProgressTracker::new(targets.len(), progress_interval);
    let mut apps = Vec::with_capacity(targets.len());
    let mut sessions = Vec::with_capacity(targets.len());

    for (idx, target) in targets.iter().enumerate() {
        let outcome = ReviewSession::new(source, predicate, options).run(target.appid).await;
        let count = outcome.reviews.len();

        let error = match &outcome.termination {
            Termination::Failed(e) => {
                warn!("Scrape of {} ({}) failed: {}", target.title, target.appid, e);
                tracker.record_failed_with_error(e.category(), count);
                Some(e.to_string())
            }
            _ => {
                tracker.record_scraped(count);
                None
            }
        };

        let report = AppReport {
            appid: target.appid,
            title: target.title.clone(),
            reviews: count,
            pages: outcome.pages_fetched,
            termination: outcome.termination.label(),
            error,
        };

        sessions.push(
            outcome
                .reviews
                .into_iter()
                .map(|r| r.with_game(target.title.clone(), target.appid))
                .collect::<Vec<_>>(),
        );

        tracker.log_progress(idx + 1);
        on_app_done(idx + 1, &report);
        apps.push(report);
    }

    tracker.log_summary("Review scrape");
    BatchResult {
        reviews: flatten_sessions(sessions),
        apps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AcceptAll;
    use crate::testing::{page, raw_review, ScriptedSource};
    use steamscope_models::TimeWindow;
    use steamscope_sources::SourceError;

    #[test]
    fn test_parse_target() {
        assert_eq!(ScrapeTarget::parse("1245620:ELDEN RING").unwrap(), ScrapeTarget::new(1245620, "ELDEN RING"));
        assert_eq!(ScrapeTarget::parse("42").unwrap(), ScrapeTarget::new(42, "42"));
        let err = ScrapeTarget::parse("abc:Game").unwrap_err();
        assert_eq!(err.input, "abc:Game");
        assert!(err.to_string().starts_with("invalid app id in 'abc:Game'"));
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let source = ScriptedSource::new();
        source.script(1, vec![Err(SourceError::Status(429))]).await;
        source
            .script(2, vec![Ok(page(vec![raw_review("x", 10, "fine"), raw_review("y", 9, "good")], None))])
            .await;
        source.script(3, vec![Ok(page(vec![], None))]).await;

        let targets = vec![
            ScrapeTarget::new(1, "Rate Limited"),
            ScrapeTarget::new(2, "Works"),
            ScrapeTarget::new(3, "Nobody Reviews"),
        ];
        let options = SessionOptions {
            window: TimeWindow::unbounded(),
            language: "english".to_string(),
            num_per_page: 100,
            order: steamscope_config::ReviewOrder::All,
            max_pages: Some(2),
            max_reviews: None,
            stop_on_stale_page: false,
        };

        let mut seen_positions = Vec::new();
        let result = scrape_batch(&source, &AcceptAll, &targets, &options, |pos, _| seen_positions.push(pos)).await;

        assert_eq!(seen_positions, vec![1, 2, 3]);
        assert_eq!(result.failed_apps(), 1);
        assert_eq!(result.reviews.len(), 2);
        assert!(result.reviews.iter().all(|r| r.appid == Some(2) && r.game_title.as_deref() == Some("Works")));
        assert_eq!(result.apps[2].termination, "empty_page");
        assert_eq!(result.apps[0].error.as_deref(), Some("unexpected HTTP status 429"));

        // Strictly sequential: app order in the request log
        let order: Vec<u32> = source.requests().await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
