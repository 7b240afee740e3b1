use serde::{Deserialize, Serialize};
use crate::review::ApiReview;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarGame {
    pub id: u32,
    pub name: String,
    pub score: f64,
    pub header_image_url: String,
    pub store_page_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictedTag {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewSummary {
    pub challenges: String,
    pub likes: String,
}

impl ReviewSummary {
    /// Same message in both fields, used for the fallback cases.
    pub fn uniform(message: &str) -> Self {
        Self {
            challenges: message.to_string(),
            likes: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub unique_score: f64,
    pub similar_games: Vec<SimilarGame>,
    pub predicted_tags: Vec<PredictedTag>,
    pub reviews: Vec<ApiReview>,
    pub review_summary: ReviewSummary,
}
