//! Fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use steamscope_models::{QuerySummary, RawAuthor, RawReview, ReviewsPage};
use steamscope_sources::{PageQuery, ReviewPageSource, SourceError};
use tokio::sync::Mutex;

pub fn raw_review(id: &str, created: i64, text: &str) -> RawReview {
    RawReview {
        recommendationid: id.to_string(),
        author: RawAuthor {
            steamid: format!("7656{}", id),
            playtime_forever: 120,
            playtime_last_two_weeks: 0,
            playtime_at_review: 90,
            last_played: created,
        },
        review: text.to_string(),
        timestamp_created: created,
        timestamp_updated: created,
        voted_up: true,
        votes_up: 1,
        votes_funny: 0,
        weighted_vote_score: 0.5,
        steam_purchase: true,
        received_for_free: false,
        written_during_early_access: false,
    }
}

pub fn page(reviews: Vec<RawReview>, cursor: Option<&str>) -> ReviewsPage {
    ReviewsPage {
        success: 1,
        query_summary: Some(QuerySummary {
            num_reviews: reviews.len() as u64,
            ..Default::default()
        }),
        reviews,
        cursor: cursor.map(|c| c.to_string()),
    }
}

/// Serves scripted pages per app and records every request.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pages: Arc<Mutex<HashMap<u32, VecDeque<Result<ReviewsPage, SourceError>>>>>,
    requests: Arc<Mutex<Vec<(u32, PageQuery)>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script(&self, appid: u32, responses: Vec<Result<ReviewsPage, SourceError>>) {
        self.pages.lock().await.insert(appid, VecDeque::from(responses));
    }

    pub async fn requests(&self) -> Vec<(u32, PageQuery)> {
        self.requests.lock().await.clone()
    }

    pub async fn cursors_for(&self, appid: u32) -> Vec<String> {
        self.requests()
            .await
            .into_iter()
            .filter(|(id, _)| *id == appid)
            .map(|(_, q)| q.cursor)
            .collect()
    }
}

#[async_trait]
impl ReviewPageSource for ScriptedSource {
    fn source_name(&self) -> &str {
        "scripted"
    }

    async fn fetch_page(&self, appid: u32, query: &PageQuery) -> Result<ReviewsPage, SourceError> {
        self.requests.lock().await.push((appid, query.clone()));
        let mut pages = self.pages.lock().await;
        pages
            .get_mut(&appid)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(SourceError::new(format!("no scripted page for app {}", appid))))
    }
}
