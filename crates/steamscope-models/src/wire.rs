//! Response shapes of the Steam `appreviews` endpoint.
//!
//! Decoding is lenient: Steam omits fields on some reviews (for example
//! `playtime_at_review` on very old ones) and encodes `weighted_vote_score`
//! as a string.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewsPage {
    pub success: i64,
    #[serde(default)]
    pub query_summary: Option<QuerySummary>,
    #[serde(default)]
    pub reviews: Vec<RawReview>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ReviewsPage {
    pub fn is_success(&self) -> bool {
        self.success == 1
    }

    /// True when upstream reports no reviews or delivers an empty list.
    pub fn is_empty(&self) -> bool {
        let summary_empty = self
            .query_summary
            .as_ref()
            .map(|s| s.num_reviews == 0)
            .unwrap_or(false);
        summary_empty || self.reviews.is_empty()
    }

    /// Cursor for the next page, `None` when absent or empty.
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuerySummary {
    #[serde(default)]
    pub num_reviews: u64,
    #[serde(default)]
    pub review_score: Option<u32>,
    #[serde(default)]
    pub review_score_desc: Option<String>,
    #[serde(default)]
    pub total_positive: Option<u64>,
    #[serde(default)]
    pub total_negative: Option<u64>,
    #[serde(default)]
    pub total_reviews: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAuthor {
    #[serde(default)]
    pub steamid: String,
    #[serde(default)]
    pub playtime_forever: u64,
    #[serde(default)]
    pub playtime_last_two_weeks: u64,
    #[serde(default)]
    pub playtime_at_review: u64,
    #[serde(default)]
    pub last_played: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawReview {
    pub recommendationid: String,
    #[serde(default)]
    pub author: RawAuthor,
    #[serde(default)]
    pub review: String,
    pub timestamp_created: i64,
    #[serde(default)]
    pub timestamp_updated: i64,
    #[serde(default)]
    pub voted_up: bool,
    #[serde(default)]
    pub votes_up: u64,
    #[serde(default)]
    pub votes_funny: u64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub weighted_vote_score: f64,
    #[serde(default)]
    pub steam_purchase: bool,
    #[serde(default)]
    pub received_for_free: bool,
    #[serde(default)]
    pub written_during_early_access: bool,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(0.0),
        Some(NumberOrString::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "success": 1,
        "query_summary": {"num_reviews": 1, "review_score": 7},
        "reviews": [{
            "recommendationid": "151",
            "author": {"steamid": "7656", "playtime_forever": 600, "playtime_last_two_weeks": 30, "last_played": 1716000000},
            "review": "Great game",
            "timestamp_created": 1716000000,
            "timestamp_updated": 1716000100,
            "voted_up": true,
            "votes_up": 3,
            "votes_funny": 1,
            "weighted_vote_score": "0.523809552192687988",
            "steam_purchase": true,
            "received_for_free": false,
            "written_during_early_access": false
        }],
        "cursor": "AoJ4"
    }"#;

    #[test]
    fn test_decode_page_with_string_vote_score() {
        let page: ReviewsPage = serde_json::from_str(PAGE).unwrap();
        assert!(page.is_success());
        assert!(!page.is_empty());
        assert_eq!(page.next_cursor(), Some("AoJ4"));

        let review = &page.reviews[0];
        assert_eq!(review.recommendationid, "151");
        assert_eq!(review.author.playtime_at_review, 0);
        assert!((review.weighted_vote_score - 0.5238).abs() < 1e-3);
    }

    #[test]
    fn test_missing_cursor_and_empty_summary() {
        let page: ReviewsPage =
            serde_json::from_str(r#"{"success": 1, "query_summary": {"num_reviews": 0}}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_cursor(), None);

        let page: ReviewsPage = serde_json::from_str(r#"{"success": 1, "cursor": ""}"#).unwrap();
        assert_eq!(page.next_cursor(), None);
    }

    #[test]
    fn test_numeric_vote_score() {
        let json = r#"{"recommendationid": "1", "timestamp_created": 5, "weighted_vote_score": 0.25}"#;
        let review: RawReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.weighted_vote_score, 0.25);
    }
}
