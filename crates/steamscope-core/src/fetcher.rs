//! Concurrent review fetching for the analysis API.

use futures::future::join_all;
use steamscope_models::ApiReview;
use steamscope_sources::ReviewPageSource;
use tracing::{info, warn};
use crate::export::to_api_reviews;
use crate::filter::ReviewPredicate;
use crate::session::{ReviewSession, SessionOptions};

/// Run one session per `(appid, name)` concurrently.
///
/// Each app keeps its own page order and results are concatenated in request
/// order. A failing app contributes whatever it collected before the failure
/// (usually nothing) and never aborts the others.
pub async fn fetch_all_reviews(
    source: &dyn ReviewPageSource,
    predicate: &dyn ReviewPredicate,
    apps: &[(u32, String)],
    options: &SessionOptions,
) -> Vec<ApiReview> {
    let futures = apps.iter().map(|(appid, name)| async move {
        let outcome = ReviewSession::new(source, predicate, options).run(*appid).await;
        if let crate::session::Termination::Failed(e) = &outcome.termination {
            warn!("Could not fetch reviews for {} (ID: {}): {}", name, appid, e);
        }
        to_api_reviews(&outcome.reviews, name)
    });

    let results = join_all(futures).await;
    let reviews: Vec<ApiReview> = results.into_iter().flatten().collect();
    info!("Fetched {} reviews for {} games", reviews.len(), apps.len());
    reviews
}
