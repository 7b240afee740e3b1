//! Keyword-based criticism tagging and per-game stability statistics.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use steamscope_config::CriticismConfig;
use steamscope_models::ReviewRecord;
use tracing::info;

pub const STABILITY: &str = "stability";

/// English stop words dropped before counting terms.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
    "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as",
    "until", "while", "of", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off",
    "over", "under", "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
    "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "don", "should", "now",
    "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "mightn", "mustn", "needn",
    "shan", "shouldn", "wasn", "weren", "won", "wouldn", "dont", "cant", "wont", "youre", "thats", "ive",
    "shes", "youve", "youll", "youd", "shouldve", "arent", "couldnt", "didnt", "doesnt", "hadnt", "hasnt",
    "havent", "isnt", "mightnt", "mustnt", "neednt", "shant", "shouldnt", "wasnt", "werent", "wouldnt",
];

/// Assigns criticism categories by keyword substring match.
#[derive(Debug, Clone)]
pub struct CriticismTagger {
    categories: Vec<(String, Vec<String>)>,
}

impl CriticismTagger {
    pub fn new(categories: &BTreeMap<String, Vec<String>>) -> Self {
        let categories = categories
            .iter()
            .map(|(label, keywords)| (label.clone(), keywords.iter().map(|k| k.to_lowercase()).collect()))
            .collect();
        Self { categories }
    }

    pub fn from_config(config: &CriticismConfig) -> Self {
        Self::new(&config.categories)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(label, _)| label.as_str())
    }

    /// Categories whose keywords appear in `text`, each at most once.
    pub fn tag(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.categories
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|(label, _)| label.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedReview {
    pub appid: Option<u32>,
    pub game_title: String,
    pub categories: HashSet<String>,
}

impl TaggedReview {
    pub fn has(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

pub fn tag_reviews(tagger: &CriticismTagger, records: &[ReviewRecord]) -> Vec<TaggedReview> {
    records
        .iter()
        .map(|r| TaggedReview {
            appid: r.appid,
            game_title: r
                .game_title
                .clone()
                .or_else(|| r.appid.map(|id| id.to_string()))
                .unwrap_or_else(|| "unknown".to_string()),
            categories: tagger.tag(&r.review_text).into_iter().collect(),
        })
        .collect()
}

fn by_game(tagged: &[TaggedReview]) -> BTreeMap<&str, Vec<&TaggedReview>> {
    let mut groups: BTreeMap<&str, Vec<&TaggedReview>> = BTreeMap::new();
    for review in tagged {
        groups.entry(review.game_title.as_str()).or_default().push(review);
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityRatio {
    pub game_title: String,
    pub stability_reviews: usize,
    pub other_reviews: usize,
    /// `stability / other`, 0 when every review is a stability complaint.
    pub stability_ratio: f64,
}

/// Highest ratio first.
pub fn stability_ratios(tagged: &[TaggedReview]) -> Vec<StabilityRatio> {
    let mut ratios: Vec<StabilityRatio> = by_game(tagged)
        .into_iter()
        .map(|(title, reviews)| {
            let stability = reviews.iter().filter(|r| r.has(STABILITY)).count();
            let other = reviews.len() - stability;
            StabilityRatio {
                game_title: title.to_string(),
                stability_reviews: stability,
                other_reviews: other,
                stability_ratio: if other > 0 { stability as f64 / other as f64 } else { 0.0 },
            }
        })
        .collect();
    ratios.sort_by(|a, b| b.stability_ratio.total_cmp(&a.stability_ratio));
    ratios
}

/// Game-level aggregate used to label games as buggy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameFeatures {
    pub game_title: String,
    pub review_count: usize,
    pub stability_sum: usize,
    pub performance_ratio: f64,
    pub design_ratio: f64,
    pub content_ratio: f64,
    pub monetization_ratio: f64,
    pub stability_ratio: f64,
    pub buggy: bool,
    pub genre: Option<String>,
}

pub fn game_features(
    tagged: &[TaggedReview],
    buggy_threshold: f64,
    genres: Option<&HashMap<u32, Vec<String>>>,
) -> Vec<GameFeatures> {
    by_game(tagged)
        .into_iter()
        .map(|(title, reviews)| {
            let count = reviews.len();
            let mean = |category: &str| reviews.iter().filter(|r| r.has(category)).count() as f64 / count as f64;
            let stability_sum = reviews.iter().filter(|r| r.has(STABILITY)).count();
            let stability_ratio = stability_sum as f64 / count as f64;
            let genre = genres.and_then(|map| {
                reviews
                    .iter()
                    .find_map(|r| r.appid.and_then(|id| map.get(&id)))
                    .and_then(|g| g.first().cloned())
            });

            GameFeatures {
                game_title: title.to_string(),
                review_count: count,
                stability_sum,
                performance_ratio: mean("performance"),
                design_ratio: mean("design"),
                content_ratio: mean("content"),
                monetization_ratio: mean("monetization"),
                stability_ratio,
                buggy: stability_ratio >= buggy_threshold,
                genre,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreCriticism {
    pub genre: String,
    pub counts: BTreeMap<String, usize>,
    pub dominant: Option<String>,
}

/// Category counts per genre; a review counts once for every genre of its game.
pub fn criticism_by_genre(tagged: &[TaggedReview], genres: &HashMap<u32, Vec<String>>) -> Vec<GenreCriticism> {
    let mut table: BTreeMap<&str, BTreeMap<String, usize>> = BTreeMap::new();
    for review in tagged {
        let Some(game_genres) = review.appid.and_then(|id| genres.get(&id)) else {
            continue;
        };
        for genre in game_genres {
            let counts = table.entry(genre.as_str()).or_default();
            for category in &review.categories {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
    }

    table
        .into_iter()
        .map(|(genre, counts)| {
            let dominant = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(c, _)| c.clone());
            GenreCriticism {
                genre: genre.to_string(),
                counts,
                dominant,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Most frequent words: lowercase letters only, no stop words, longer than two.
pub fn top_terms<'a, I>(texts: I, n: usize) -> Vec<TermCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
            .collect();
        for word in cleaned.split_whitespace() {
            if word.len() > 2 && !stop.contains(word) {
                *counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<TermCount> = counts.into_iter().map(|(term, count)| TermCount { term, count }).collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticismReport {
    pub reviews: usize,
    pub category_totals: BTreeMap<String, usize>,
    pub stability: Vec<StabilityRatio>,
    pub games: Vec<GameFeatures>,
    pub top_terms: Vec<TermCount>,
    pub genres: Vec<GenreCriticism>,
}

impl CriticismReport {
    pub fn buggy_games(&self) -> impl Iterator<Item = &GameFeatures> {
        self.games.iter().filter(|g| g.buggy)
    }
}

pub fn analyze_reviews(
    records: &[ReviewRecord],
    config: &CriticismConfig,
    genres: Option<&HashMap<u32, Vec<String>>>,
) -> CriticismReport {
    let tagger = CriticismTagger::from_config(config);
    let tagged = tag_reviews(&tagger, records);

    let mut category_totals: BTreeMap<String, usize> =
        tagger.category_names().map(|c| (c.to_string(), 0)).collect();
    for review in &tagged {
        for category in &review.categories {
            *category_totals.entry(category.clone()).or_insert(0) += 1;
        }
    }

    let report = CriticismReport {
        reviews: records.len(),
        category_totals,
        stability: stability_ratios(&tagged),
        games: game_features(&tagged, config.buggy_threshold, genres),
        top_terms: top_terms(records.iter().map(|r| r.review_text.as_str()), config.top_terms),
        genres: genres.map(|g| criticism_by_genre(&tagged, g)).unwrap_or_default(),
    };
    info!(
        "Criticism analysis: {} reviews over {} games, {} labelled buggy",
        report.reviews,
        report.games.len(),
        report.buggy_games().count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::raw_review;

    fn record(game: &str, appid: u32, text: &str) -> ReviewRecord {
        ReviewRecord::from_raw(&raw_review("1", 100, text)).with_game(game, appid)
    }

    fn tagger() -> CriticismTagger {
        CriticismTagger::from_config(&CriticismConfig::default())
    }

    #[test]
    fn test_tag_counts_each_category_once() {
        let tags = tagger().tag("Constant CRASHES and bugs, also the servers lag");
        assert_eq!(tags.iter().filter(|t| *t == "stability").count(), 1);
        assert!(tags.contains(&"stability".to_string()));
        assert!(tags.contains(&"multiplayer".to_string()));
        assert!(tags.contains(&"performance".to_string()));
        assert!(!tags.contains(&"politics".to_string()));
    }

    #[test]
    fn test_tag_nothing_for_praise() {
        assert!(tagger().tag("A wonderful little gem").is_empty());
    }

    #[test]
    fn test_stability_ratio() {
        let records = vec![
            record("Broken", 1, "crash on launch"),
            record("Broken", 1, "another crash"),
            record("Broken", 1, "fine otherwise"),
            record("AllBugs", 2, "bugs"),
            record("Clean", 3, "lovely"),
        ];
        let tagged = tag_reviews(&tagger(), &records);
        let ratios = stability_ratios(&tagged);

        assert_eq!(ratios[0].game_title, "Broken");
        assert_eq!(ratios[0].stability_ratio, 2.0);
        let all_bugs = ratios.iter().find(|r| r.game_title == "AllBugs").unwrap();
        assert_eq!(all_bugs.other_reviews, 0);
        assert_eq!(all_bugs.stability_ratio, 0.0);
    }

    #[test]
    fn test_game_features_buggy_label() {
        let mut records: Vec<ReviewRecord> = (0..9).map(|_| record("Edge", 7, "nice")).collect();
        records.push(record("Edge", 7, "one glitch, too expensive for what it is"));
        let tagged = tag_reviews(&tagger(), &records);

        let mut genres = HashMap::new();
        genres.insert(7, vec!["Platformer".to_string(), "Puzzle".to_string()]);
        let features = game_features(&tagged, 0.10, Some(&genres));

        assert_eq!(features.len(), 1);
        let edge = &features[0];
        assert_eq!(edge.review_count, 10);
        assert_eq!(edge.stability_sum, 1);
        assert!((edge.stability_ratio - 0.1).abs() < 1e-12);
        assert!(edge.buggy);
        assert!((edge.monetization_ratio - 0.1).abs() < 1e-12);
        assert_eq!(edge.genre.as_deref(), Some("Platformer"));

        let strict = game_features(&tagged, 0.2, None);
        assert!(!strict[0].buggy);
        assert_eq!(strict[0].genre, None);
    }

    #[test]
    fn test_top_terms() {
        let terms = top_terms(
            vec!["The game is GREAT, great fun!", "Great music; the bosses are fun 10/10", "ok go"],
            2,
        );
        assert_eq!(terms[0], TermCount { term: "great".to_string(), count: 3 });
        assert_eq!(terms[1], TermCount { term: "fun".to_string(), count: 2 });
    }

    #[test]
    fn test_criticism_by_genre() {
        let records = vec![record("A", 1, "crash"), record("A", 1, "crash and lag"), record("B", 2, "dlc greedy")];
        let tagged = tag_reviews(&tagger(), &records);
        let mut genres = HashMap::new();
        genres.insert(1, vec!["Action".to_string()]);
        genres.insert(2, vec!["Action".to_string(), "RPG".to_string()]);

        let by_genre = criticism_by_genre(&tagged, &genres);
        let action = by_genre.iter().find(|g| g.genre == "Action").unwrap();
        assert_eq!(action.counts.get("stability"), Some(&2));
        assert_eq!(action.counts.get("monetization"), Some(&1));
        assert_eq!(action.dominant.as_deref(), Some("stability"));
        let rpg = by_genre.iter().find(|g| g.genre == "RPG").unwrap();
        assert_eq!(rpg.dominant.as_deref(), Some("monetization"));
    }

    #[test]
    fn test_analyze_reviews_report() {
        let records = vec![record("A", 1, "crash crash"), record("B", 2, "boring and repetitive")];
        let report = analyze_reviews(&records, &CriticismConfig::default(), None);
        assert_eq!(report.reviews, 2);
        assert_eq!(report.category_totals.len(), 9);
        assert_eq!(report.category_totals["stability"], 1);
        assert_eq!(report.category_totals["content"], 1);
        assert_eq!(report.buggy_games().count(), 1);
        assert!(report.genres.is_empty());
    }
}
