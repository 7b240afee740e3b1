//! Description analysis: similar games, predicted tags, their reviews and a
//! summary of what players say about them.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use steamscope_config::ServerConfig;
use steamscope_models::{AnalysisResult, ApiReview, GameEntry, PredictedTag, ReviewSummary, SimilarGame};
use steamscope_sources::{GeminiClient, ReviewPageSource};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use crate::catalog::{read_games_data, CatalogError};
use crate::fetcher::fetch_all_reviews;
use crate::filter::{AcceptAll, ReviewPredicate};
use crate::session::SessionOptions;
use crate::similarity::{clean_query_text, cosine, top_k, SparseVector, TfidfVectorizer};

pub const NOT_CONFIGURED: &str = "API key not configured.";
pub const NO_REVIEWS: &str = "No reviews were found to summarize.";
pub const SUMMARY_FAILED: &str = "An error occurred while summarizing.";
pub const UNPARSED_LIKES: &str = "Could not parse summary.";

const CHALLENGES_HEADING: &str = "Common Challenges & Criticisms:";
const LIKES_HEADING: &str = "Common Likes & Praises:";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download games data: {0}")]
    Download(#[from] reqwest::Error),
    #[error("games data download returned HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("games data is empty")]
    EmptyGamesData,
    #[error("Server is not ready.")]
    NotReady,
}

/// Everything the analyzer needs, built once from the games data.
#[derive(Debug)]
pub struct AnalysisContext {
    games: Vec<GameEntry>,
    game_vectorizer: TfidfVectorizer,
    game_vectors: Vec<SparseVector>,
    tags: Vec<String>,
    tag_vectorizer: TfidfVectorizer,
    tag_vectors: Vec<SparseVector>,
}

impl AnalysisContext {
    pub fn build(games: Vec<GameEntry>) -> Result<Self, AnalysisError> {
        if games.is_empty() {
            return Err(AnalysisError::EmptyGamesData);
        }

        let (game_vectorizer, game_vectors) =
            TfidfVectorizer::fit_transform(games.iter().map(|g| g.combined_text.as_str()));

        let tags: Vec<String> = games
            .iter()
            .flat_map(|g| g.tag_list())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let (tag_vectorizer, tag_vectors) = TfidfVectorizer::fit_transform(tags.iter().map(String::as_str));

        info!(
            "Analysis context ready: {} games, {} terms, {} tags",
            games.len(),
            game_vectorizer.vocabulary_len(),
            tags.len()
        );
        Ok(Self {
            games,
            game_vectorizer,
            game_vectors,
            tags,
            tag_vectorizer,
            tag_vectors,
        })
    }

    /// Load games data from a local CSV or an `http(s)://` URL.
    pub async fn load(location: &str, client: &reqwest::Client) -> Result<Self, AnalysisError> {
        info!("Loading games data from {}", location);
        let bytes = if location.starts_with("http://") || location.starts_with("https://") {
            let response = client.get(location).send().await?;
            if !response.status().is_success() {
                return Err(AnalysisError::Status(response.status().as_u16()));
            }
            response.bytes().await?.to_vec()
        } else {
            tokio::fs::read(location).await.map_err(|source| AnalysisError::Io {
                path: PathBuf::from(location),
                source,
            })?
        };

        let games = read_games_data(bytes.as_slice())?;
        Self::build(games)
    }

    pub fn games(&self) -> &[GameEntry] {
        &self.games
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Cosine score of `description` against every game.
    pub fn game_scores(&self, description: &str) -> Vec<f64> {
        let query = self.game_vectorizer.transform(description);
        self.game_vectors.iter().map(|v| cosine(&query, v)).collect()
    }

    pub fn predicted_tags(&self, description: &str, k: usize) -> Vec<PredictedTag> {
        let query = self.tag_vectorizer.transform(description);
        let scores: Vec<f64> = self.tag_vectors.iter().map(|v| cosine(&query, v)).collect();
        top_k(&scores, k)
            .into_iter()
            .map(|i| PredictedTag {
                name: self.tags[i].clone(),
                score: scores[i],
            })
            .collect()
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, reviews: &[ApiReview]) -> ReviewSummary;
}

/// Market-analyst prompt over every review, or `None` when there are none.
pub fn build_prompt(reviews: &[ApiReview]) -> Option<String> {
    if reviews.is_empty() {
        return None;
    }

    let mut lines = String::new();
    for review in reviews {
        let sentiment = if review.recommended { "Positive" } else { "Negative" };
        lines.push_str(&format!(
            "- ({} review for game '{}'): {}\n",
            sentiment, review.name, review.review_text
        ));
    }

    Some(format!(
        "You are a video game market analyst. Analyze the following player reviews for a set of similar games.\n\
         Based *only* on the text provided, identify the common themes.\n\n\
         Reviews:\n{lines}\n---\n\n\
         Provide your analysis in two distinct categories:\n\
         1. **{challenges}** What are the recurring problems, frustrations, or negative feedback points players mention? \
         (e.g., bugs, repetitive gameplay, poor controls). Do not be specific on one game.\n\
         2. **{likes}** What are the recurring positive aspects that players enjoy? \
         (e.g., great story, fun mechanics, beautiful art style). Do not be specific on one game.\n\n\
         Present your summary as two bulleted lists. Do not add any extra commentary or introduction.\n",
        lines = lines,
        challenges = CHALLENGES_HEADING,
        likes = LIKES_HEADING,
    ))
}

/// Split a model reply into challenges and likes at the likes heading.
pub fn parse_summary(text: &str) -> ReviewSummary {
    match text.split_once(LIKES_HEADING) {
        Some((challenges, likes)) => ReviewSummary {
            challenges: challenges.replace(CHALLENGES_HEADING, "").trim().to_string(),
            likes: likes.trim().to_string(),
        },
        None => ReviewSummary {
            challenges: text.replace(CHALLENGES_HEADING, "").trim().to_string(),
            likes: UNPARSED_LIKES.to_string(),
        },
    }
}

pub struct GeminiSummarizer {
    client: Option<GeminiClient>,
}

impl GeminiSummarizer {
    /// `None` means no API key was configured.
    pub fn new(client: Option<GeminiClient>) -> Self {
        if client.is_none() {
            warn!("No Google API key configured; review summaries are disabled");
        }
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, reviews: &[ApiReview]) -> ReviewSummary {
        let Some(client) = &self.client else {
            return ReviewSummary::uniform(NOT_CONFIGURED);
        };
        let Some(prompt) = build_prompt(reviews) else {
            return ReviewSummary::uniform(NO_REVIEWS);
        };

        match client.generate(&prompt).await {
            Ok(text) => parse_summary(&text),
            Err(e) => {
                warn!("Summary request failed: {}", e);
                ReviewSummary::uniform(SUMMARY_FAILED)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub similar_games: usize,
    pub predicted_tags: usize,
    pub reviews_per_game: usize,
    pub max_pages: u32,
}

impl From<&ServerConfig> for AnalysisSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            similar_games: config.similar_games,
            predicted_tags: config.predicted_tags,
            reviews_per_game: config.reviews_per_game,
            max_pages: config.max_pages,
        }
    }
}

pub struct Analyzer {
    source: Arc<dyn ReviewPageSource>,
    predicate: Arc<dyn ReviewPredicate>,
    summarizer: Arc<dyn Summarizer>,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(source: Arc<dyn ReviewPageSource>, summarizer: Arc<dyn Summarizer>, settings: AnalysisSettings) -> Self {
        Self {
            source,
            predicate: Arc::new(AcceptAll),
            summarizer,
            settings,
        }
    }

    pub fn with_predicate(mut self, predicate: Arc<dyn ReviewPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub async fn analyze(&self, context: &AnalysisContext, description: &str) -> AnalysisResult {
        let cleaned = clean_query_text(description);
        let scores = context.game_scores(&cleaned);
        let best = top_k(&scores, self.settings.similar_games);

        let similar_games: Vec<SimilarGame> = best
            .iter()
            .map(|&i| {
                let game = &context.games[i];
                SimilarGame {
                    id: game.appid,
                    name: game.name.clone(),
                    score: scores[i],
                    header_image_url: game.header_image_url.clone(),
                    store_page_url: game.store_page_url.clone(),
                }
            })
            .collect();

        let max_score = scores.iter().copied().fold(0.0f64, f64::max);
        let predicted_tags = context.predicted_tags(&cleaned, self.settings.predicted_tags);

        let apps: Vec<(u32, String)> = similar_games.iter().map(|g| (g.id, g.name.clone())).collect();
        let options = SessionOptions::on_demand(self.settings.reviews_per_game, self.settings.max_pages);
        let reviews = fetch_all_reviews(self.source.as_ref(), self.predicate.as_ref(), &apps, &options).await;
        let review_summary = self.summarizer.summarize(&reviews).await;

        AnalysisResult {
            unique_score: 1.0 - max_score,
            similar_games,
            predicted_tags,
            reviews,
            review_summary,
        }
    }
}

/// Shared server state. The context stays `None` until loading finishes,
/// and forever if loading fails.
#[derive(Clone)]
pub struct AppState {
    context: Arc<RwLock<Option<Arc<AnalysisContext>>>>,
    analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            context: Arc::new(RwLock::new(None)),
            analyzer: Arc::new(analyzer),
        }
    }

    pub async fn set_context(&self, context: AnalysisContext) {
        *self.context.write().await = Some(Arc::new(context));
    }

    pub async fn is_ready(&self) -> bool {
        self.context.read().await.is_some()
    }

    pub async fn analyze(&self, description: &str) -> Result<AnalysisResult, AnalysisError> {
        let context = self.context.read().await.clone().ok_or(AnalysisError::NotReady)?;
        Ok(self.analyzer.analyze(&context, description).await)
    }
}
