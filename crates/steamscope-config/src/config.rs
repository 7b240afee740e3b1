use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub quality_filter: QualityFilterConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub criticism: CriticismConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scrape.num_per_page == 0 || self.scrape.num_per_page > 100 {
            return Err(ConfigError::Invalid(format!(
                "scrape.num_per_page must be between 1 and 100, got {}",
                self.scrape.num_per_page
            )));
        }
        if let (Some(start), Some(end)) = (self.scrape.start, self.scrape.end) {
            if start >= end {
                return Err(ConfigError::Invalid(format!(
                    "scrape.start ({}) must be before scrape.end ({})",
                    start, end
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.selection.sample_fraction) {
            return Err(ConfigError::Invalid(format!(
                "selection.sample_fraction must be within [0, 1], got {}",
                self.selection.sample_fraction
            )));
        }
        if self.quality_filter.symbol_run == 0 {
            return Err(ConfigError::Invalid("quality_filter.symbol_run must be positive".to_string()));
        }
        if self.quality_filter.symbol_lines == 0 {
            return Err(ConfigError::Invalid("quality_filter.symbol_lines must be positive".to_string()));
        }
        if !(self.stability.test_fraction > 0.0 && self.stability.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "stability.test_fraction must be within (0, 1), got {}",
                self.stability.test_fraction
            )));
        }
        if self.stability.n_trees == 0 {
            return Err(ConfigError::Invalid("stability.n_trees must be positive".to_string()));
        }
        if self.server.max_pages == 0 {
            return Err(ConfigError::Invalid("server.max_pages must be positive".to_string()));
        }
        Ok(())
    }
}

/// Review ordering requested from the `appreviews` endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOrder {
    Recent,
    Updated,
    All,
}

impl ReviewOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOrder::Recent => "recent",
            ReviewOrder::Updated => "updated",
            ReviewOrder::All => "all",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_num_per_page")]
    pub num_per_page: u32,
    #[serde(default = "default_batch_order")]
    pub order: ReviewOrder,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_scrape_start")]
    pub start: Option<DateTime<Utc>>,
    /// `None` means "now" at the time the scrape starts.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "default_scrape_output")]
    pub output: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            num_per_page: default_num_per_page(),
            order: default_batch_order(),
            max_pages: default_max_pages(),
            start: default_scrape_start(),
            end: None,
            output: default_scrape_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
    #[serde(default = "default_symbol_run")]
    pub symbol_run: usize,
    #[serde(default = "default_symbol_lines")]
    pub symbol_lines: usize,
}

impl Default for QualityFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_words: default_max_words(),
            max_line_chars: default_max_line_chars(),
            symbol_run: default_symbol_run(),
            symbol_lines: default_symbol_lines(),
        }
    }
}

/// Column names and thresholds for the game catalog CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_appid_column")]
    pub appid_column: String,
    #[serde(default = "default_title_column")]
    pub title_column: String,
    #[serde(default = "default_reviews_total_column")]
    pub reviews_total_column: String,
    #[serde(default = "default_review_score_column")]
    pub review_score_column: String,
    #[serde(default = "default_tags_column")]
    pub tags_column: String,
    #[serde(default = "default_launch_price_column")]
    pub launch_price_column: String,
    #[serde(default = "default_required_tag")]
    pub required_tag: String,
    #[serde(default = "default_min_reviews")]
    pub min_reviews: u64,
    #[serde(default = "default_boxleiter")]
    pub boxleiter_multiplier: f64,
    #[serde(default = "default_top_genres")]
    pub top_genres: usize,
    #[serde(default = "default_revenue_threshold")]
    pub revenue_threshold: f64,
    #[serde(default = "default_genre_sample")]
    pub per_genre_sample: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            appid_column: default_appid_column(),
            title_column: default_title_column(),
            reviews_total_column: default_reviews_total_column(),
            review_score_column: default_review_score_column(),
            tags_column: default_tags_column(),
            launch_price_column: default_launch_price_column(),
            required_tag: default_required_tag(),
            min_reviews: default_min_reviews(),
            boxleiter_multiplier: default_boxleiter(),
            top_genres: default_top_genres(),
            revenue_threshold: default_revenue_threshold(),
            per_genre_sample: default_genre_sample(),
        }
    }
}

/// Which catalog games the batch scraper targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionConfig {
    #[serde(default = "default_max_review_score")]
    pub max_review_score: f64,
    #[serde(default = "default_min_review_count")]
    pub min_review_count: u64,
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_review_score: default_max_review_score(),
            min_review_count: default_min_review_count(),
            sample_fraction: default_sample_fraction(),
            seed: None,
        }
    }
}

/// Columns of the raw store export turned into the API games data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessConfig {
    #[serde(default = "default_required_language")]
    pub required_language: String,
    #[serde(default = "default_preprocess_min_reviews")]
    pub min_total_reviews: u64,
    #[serde(default = "default_languages_column")]
    pub languages_column: String,
    #[serde(default = "default_total_reviews_column")]
    pub total_reviews_column: String,
    #[serde(default = "default_description_column")]
    pub description_column: String,
    #[serde(default = "default_raw_tags_column")]
    pub tags_column: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            required_language: default_required_language(),
            min_total_reviews: default_preprocess_min_reviews(),
            languages_column: default_languages_column(),
            total_reviews_column: default_total_reviews_column(),
            description_column: default_description_column(),
            tags_column: default_raw_tags_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticismConfig {
    #[serde(default = "default_buggy_threshold")]
    pub buggy_threshold: f64,
    #[serde(default = "default_top_terms")]
    pub top_terms: usize,
    #[serde(default = "default_criticism_categories")]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for CriticismConfig {
    fn default() -> Self {
        Self {
            buggy_threshold: default_buggy_threshold(),
            top_terms: default_top_terms(),
            categories: default_criticism_categories(),
        }
    }
}

/// Buggy-game classifier training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilityConfig {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_stability_seed")]
    pub seed: u64,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Neighbours considered when synthesising minority samples.
    #[serde(default = "default_smote_neighbors")]
    pub smote_neighbors: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_stability_seed(),
            n_trees: default_n_trees(),
            smote_neighbors: default_smote_neighbors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Local path or http(s) URL of the preprocessed games data CSV.
    #[serde(default = "default_games_data")]
    pub games_data: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_similar_games")]
    pub similar_games: usize,
    #[serde(default = "default_predicted_tags")]
    pub predicted_tags: usize,
    #[serde(default = "default_reviews_per_game")]
    pub reviews_per_game: usize,
    /// Page cap for each on-demand review session.
    #[serde(default = "default_server_max_pages")]
    pub max_pages: u32,
    /// Run fetched reviews through `[quality_filter]`.
    #[serde(default)]
    pub filter_reviews: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            games_data: default_games_data(),
            allowed_origins: default_allowed_origins(),
            similar_games: default_similar_games(),
            predicted_tags: default_predicted_tags(),
            reviews_per_game: default_reviews_per_game(),
            max_pages: default_server_max_pages(),
            filter_reviews: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_model")]
    pub model: String,
    #[serde(default = "default_summarizer_endpoint")]
    pub endpoint: String,
    /// Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl SummarizerConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: default_summarizer_model(),
            endpoint: default_summarizer_endpoint(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_store_base_url")]
    pub store_base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            store_base_url: default_store_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "english".to_string()
}

fn default_num_per_page() -> u32 {
    100
}

fn default_batch_order() -> ReviewOrder {
    ReviewOrder::All
}

fn default_max_pages() -> u32 {
    2
}

fn default_scrape_start() -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single()
}

fn default_scrape_output() -> PathBuf {
    PathBuf::from("exported_data/controversial_reviews.csv")
}

fn default_max_words() -> usize {
    300
}

fn default_max_line_chars() -> usize {
    80
}

fn default_symbol_run() -> usize {
    5
}

fn default_symbol_lines() -> usize {
    2
}

fn default_appid_column() -> String {
    "AppID".to_string()
}

fn default_title_column() -> String {
    "Name".to_string()
}

fn default_reviews_total_column() -> String {
    "Reviews Total".to_string()
}

fn default_review_score_column() -> String {
    "Reviews Score Fancy".to_string()
}

fn default_tags_column() -> String {
    "Tags".to_string()
}

fn default_launch_price_column() -> String {
    "Launch Price".to_string()
}

fn default_required_tag() -> String {
    "Indie".to_string()
}

fn default_min_reviews() -> u64 {
    10
}

fn default_boxleiter() -> f64 {
    50.0
}

fn default_top_genres() -> usize {
    40
}

fn default_revenue_threshold() -> f64 {
    50_000.0
}

fn default_genre_sample() -> usize {
    200
}

fn default_max_review_score() -> f64 {
    70.0
}

fn default_min_review_count() -> u64 {
    500
}

fn default_sample_fraction() -> f64 {
    0.5
}

fn default_required_language() -> String {
    "English".to_string()
}

fn default_preprocess_min_reviews() -> u64 {
    500
}

fn default_languages_column() -> String {
    "supported_languages".to_string()
}

fn default_total_reviews_column() -> String {
    "num_reviews_total".to_string()
}

fn default_description_column() -> String {
    "detailed_description".to_string()
}

fn default_raw_tags_column() -> String {
    "tags".to_string()
}

fn default_buggy_threshold() -> f64 {
    0.10
}

fn default_top_terms() -> usize {
    50
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_games_data() -> String {
    "api/preprocessed_data/games_data.csv".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://0.0.0.0".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_similar_games() -> usize {
    5
}

fn default_predicted_tags() -> usize {
    3
}

fn default_reviews_per_game() -> usize {
    100
}

fn default_server_max_pages() -> u32 {
    10
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_stability_seed() -> u64 {
    42
}

fn default_n_trees() -> usize {
    100
}

fn default_smote_neighbors() -> usize {
    5
}

fn default_summarizer_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_summarizer_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_store_base_url() -> String {
    "https://store.steampowered.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("steamscope/", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn default_criticism_categories() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 9] = [
        ("performance", &[
            "lag", "low fps", "frame drops", "frame rate", "stutter", "sluggish",
            "slow", "performance issues", "poor performance", "optimization",
            "not optimized", "bad fps", "inconsistent fps",
        ]),
        ("stability", &[
            "crash", "crashes", "bug", "bugs", "glitch", "glitches",
            "freeze", "freezes", "freezing", "crashing", "broken", "corrupted",
            "softlock", "hardlock", "unplayable",
        ]),
        ("content", &[
            "boring", "repetitive", "nothing to do", "empty", "lack of content",
            "too short", "too little content", "shallow", "unfinished",
            "needs more content", "barebones", "no replay value",
        ]),
        ("design", &[
            "unbalanced", "imbalanced", "pay to win", "pay2win", "grindy", "grinding",
            "tedious", "unfair", "clunky", "awkward", "poorly designed",
            "frustrating", "janky", "bad design", "bad mechanics", "bad ai",
            "bad level design", "bad difficulty curve",
        ]),
        ("monetization", &[
            "dlc", "microtransaction", "microtransactions", "overpriced", "greedy",
            "cash grab", "paywall", "monetization", "nickel and diming",
            "money hungry", "milking", "battle pass", "paid cosmetics",
            "locked behind paywall", "expensive for what it is",
        ]),
        ("communication", &[
            "abandoned", "roadmap", "developers don't care", "devs silent",
            "no updates", "ignored", "lack of communication", "radio silence",
            "no patch notes", "devs stopped", "devs gone", "no response",
            "false promises", "broken promises",
        ]),
        ("ui_ux", &[
            "bad controls", "unintuitive", "ui is terrible", "bad ui",
            "confusing menus", "camera issues", "hud is bad", "poor interface",
            "bad interface", "weird controls", "clunky controls", "bad keybinds",
            "menu navigation sucks", "bad layout", "no controller support",
        ]),
        ("multiplayer", &[
            "multiplayer", "online", "co-op", "coop", "server", "servers",
            "disconnect", "disconnects", "matchmaking", "no matchmaking",
            "desync", "netcode", "connection", "latency", "laggy online",
            "lobby", "host", "peer", "rubberbanding", "can't connect",
            "can't join", "matchmaking broken", "network error",
        ]),
        ("politics", &[
            "woke", "sjw", "agenda", "identity politics", "forced diversity",
            "political", "virtue signaling", "gender politics", "race agenda",
            "checklist casting", "token character", "lgbt agenda", "too political",
            "social commentary", "representation forced",
        ]),
    ];

    table
        .iter()
        .map(|(label, keywords)| {
            (label.to_string(), keywords.iter().map(|k| k.to_string()).collect())
        })
        .collect()
}
