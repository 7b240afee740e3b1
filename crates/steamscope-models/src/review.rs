use serde::{Deserialize, Serialize};
use crate::wire::RawReview;

/// One accepted user review.
///
/// Field names and declaration order are the export column order; existing
/// downstream consumers read the CSV by these exact headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub recommendationid: String,
    pub author_steamid: String,
    pub playtime_at_review_minutes: u64,
    pub playtime_forever_minutes: u64,
    pub playtime_last_two_weeks_minutes: u64,
    pub last_played: i64,

    pub review_text: String,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,

    pub voted_up: bool,
    pub votes_up: u64,
    pub votes_funny: u64,
    pub weighted_vote_score: f64,
    pub steam_purchase: bool,
    pub received_for_free: bool,
    pub written_during_early_access: bool,

    // Filled in by the batch scraper once the record is attributed to a game
    #[serde(default)]
    pub game_title: Option<String>,
    #[serde(default)]
    pub appid: Option<u32>,
}

impl ReviewRecord {
    pub fn from_raw(raw: &RawReview) -> Self {
        Self {
            recommendationid: raw.recommendationid.clone(),
            author_steamid: raw.author.steamid.clone(),
            playtime_at_review_minutes: raw.author.playtime_at_review,
            playtime_forever_minutes: raw.author.playtime_forever,
            playtime_last_two_weeks_minutes: raw.author.playtime_last_two_weeks,
            last_played: raw.author.last_played,
            review_text: raw.review.clone(),
            timestamp_created: raw.timestamp_created,
            timestamp_updated: raw.timestamp_updated,
            voted_up: raw.voted_up,
            votes_up: raw.votes_up,
            votes_funny: raw.votes_funny,
            weighted_vote_score: raw.weighted_vote_score,
            steam_purchase: raw.steam_purchase,
            received_for_free: raw.received_for_free,
            written_during_early_access: raw.written_during_early_access,
            game_title: None,
            appid: None,
        }
    }

    pub fn with_game(mut self, title: impl Into<String>, appid: u32) -> Self {
        self.game_title = Some(title.into());
        self.appid = Some(appid);
        self
    }
}

/// Review shape returned by the analysis API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiReview {
    pub id: String,
    pub name: String,
    pub review_text: String,
    pub recommended: bool,
}

impl ApiReview {
    pub fn from_record(record: &ReviewRecord, game_name: &str) -> Self {
        Self {
            id: record.recommendationid.clone(),
            name: game_name.to_string(),
            review_text: record.review_text.clone(),
            recommended: record.voted_up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::RawAuthor;

    fn raw_review() -> RawReview {
        RawReview {
            recommendationid: "42".to_string(),
            author: RawAuthor {
                steamid: "76561198000000000".to_string(),
                playtime_forever: 1200,
                playtime_last_two_weeks: 60,
                playtime_at_review: 900,
                last_played: 1_716_000_500,
            },
            review: "Solid roguelite".to_string(),
            timestamp_created: 1_716_000_000,
            timestamp_updated: 1_716_000_100,
            voted_up: true,
            votes_up: 4,
            votes_funny: 0,
            weighted_vote_score: 0.5,
            steam_purchase: true,
            received_for_free: false,
            written_during_early_access: false,
        }
    }

    #[test]
    fn test_record_maps_author_fields() {
        let record = ReviewRecord::from_raw(&raw_review());
        assert_eq!(record.author_steamid, "76561198000000000");
        assert_eq!(record.playtime_at_review_minutes, 900);
        assert_eq!(record.playtime_forever_minutes, 1200);
        assert_eq!(record.playtime_last_two_weeks_minutes, 60);
        assert_eq!(record.last_played, 1_716_000_500);
        assert!(record.game_title.is_none());
    }

    #[test]
    fn test_api_review_from_record() {
        let record = ReviewRecord::from_raw(&raw_review()).with_game("Hades", 1145360);
        let api = ApiReview::from_record(&record, "Hades");
        assert_eq!(api.id, "42");
        assert_eq!(api.name, "Hades");
        assert!(api.recommended);
        assert_eq!(record.appid, Some(1145360));
    }
}
