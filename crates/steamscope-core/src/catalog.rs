//! Game catalog cleaning, revenue estimation and genre statistics.
//!
//! Column names and thresholds all come from [`CatalogConfig`] /
//! [`PreprocessConfig`]; nothing here assumes a particular export layout.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use steamscope_config::{CatalogConfig, PreprocessConfig, SelectionConfig};
use steamscope_models::GameEntry;
use thiserror::Error;
use tracing::{debug, info};
use crate::batch::ScrapeTarget;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("html tag pattern is valid"));
static DISALLOWED_DESCRIPTION_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s,.\-]").expect("description charset pattern is valid"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("column '{0}' not found in catalog")]
    MissingColumn(String),
}

/// A CSV file held as raw string records, addressed by header name.
#[derive(Debug, Clone)]
pub struct CatalogTable {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl CatalogTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let rows = csv_reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} catalog rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Result<usize, CatalogError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> &[csv::StringRecord] {
        &self.rows
    }
}

fn field<'a>(row: &'a csv::StringRecord, idx: usize) -> &'a str {
    row.get(idx).unwrap_or("").trim()
}

fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<u64>()
        .ok()
        .or_else(|| cleaned.trim().parse::<f64>().ok().map(|f| f as u64))
}

/// Parse a review score such as `85`, `85.5` or `85%`.
fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse().ok()
}

/// Parse a store launch price.
///
/// The character three places from the end is the decimal separator
/// (`.` or `,`), whatever the locale; currency symbols, thousands
/// separators and (non-breaking) spaces are dropped.
pub fn parse_launch_price(raw: &str) -> Option<f64> {
    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();
    let prefix: String = chars[..len.saturating_sub(3)].iter().collect();
    let suffix: String = chars[len.saturating_sub(2)..].iter().collect();
    let normalized = format!("{}.{}", prefix, suffix);
    let cleaned: String = normalized
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    cleaned.trim().parse().ok()
}

/// One catalog game after row-level cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogGame {
    pub appid: Option<u32>,
    pub title: String,
    pub reviews_total: u64,
    pub review_score: Option<f64>,
    pub launch_price: Option<f64>,
    pub tags: Vec<String>,
}

/// One (game, genre) pair after exploding tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreEntry {
    pub appid: Option<u32>,
    pub title: String,
    pub genre: String,
    pub reviews_total: u64,
    pub launch_price: f64,
    pub estimated_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreRevenue {
    pub genre: String,
    pub games: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreSuccess {
    pub genre: String,
    pub games: usize,
    /// Percentage of games at or above the revenue threshold.
    pub success_rate: f64,
}

/// The single data-cleaning pipeline for catalog exports.
#[derive(Debug, Clone)]
pub struct CatalogCleaner {
    config: CatalogConfig,
}

impl CatalogCleaner {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Keep games with enough reviews that carry the required tag.
    pub fn games(&self, table: &CatalogTable) -> Result<Vec<CatalogGame>, CatalogError> {
        let cfg = &self.config;
        let reviews_col = table.column(&cfg.reviews_total_column)?;
        let tags_col = table.column(&cfg.tags_column)?;
        let title_col = table.column(&cfg.title_column)?;
        let appid_col = table.column(&cfg.appid_column).ok();
        let score_col = table.column(&cfg.review_score_column).ok();
        let price_col = table.column(&cfg.launch_price_column).ok();

        let mut games = Vec::new();
        let mut skipped = 0usize;
        for row in table.rows() {
            let Some(reviews_total) = parse_count(field(row, reviews_col)) else {
                skipped += 1;
                continue;
            };
            if reviews_total < cfg.min_reviews {
                continue;
            }
            let tags_raw = field(row, tags_col);
            if !tags_raw.contains(cfg.required_tag.as_str()) {
                continue;
            }

            games.push(CatalogGame {
                appid: appid_col.and_then(|c| field(row, c).parse().ok()),
                title: field(row, title_col).to_string(),
                reviews_total,
                review_score: score_col.and_then(|c| parse_score(field(row, c))),
                launch_price: price_col.and_then(|c| parse_launch_price(field(row, c))),
                tags: tags_raw
                    .split(", ")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            });
        }

        if skipped > 0 {
            debug!("Skipped {} catalog rows with unreadable review totals", skipped);
        }
        Ok(games)
    }

    /// Explode tags into genres, drop the required tag itself and keep the
    /// most frequent genres. Games without a parseable price are dropped.
    pub fn genre_entries(&self, games: &[CatalogGame]) -> Vec<GenreEntry> {
        let cfg = &self.config;
        let mut exploded = Vec::new();
        for game in games {
            let Some(price) = game.launch_price else {
                continue;
            };
            let estimated_revenue = game.reviews_total as f64 * cfg.boxleiter_multiplier * price;
            for tag in &game.tags {
                if tag.contains(cfg.required_tag.as_str()) {
                    continue;
                }
                exploded.push(GenreEntry {
                    appid: game.appid,
                    title: game.title.clone(),
                    genre: tag.clone(),
                    reviews_total: game.reviews_total,
                    launch_price: price,
                    estimated_revenue,
                });
            }
        }

        let top: HashSet<String> = top_genres(&exploded, cfg.top_genres).into_iter().collect();
        exploded.retain(|e| top.contains(&e.genre));
        exploded
    }

    pub fn clean(&self, table: &CatalogTable) -> Result<Vec<GenreEntry>, CatalogError> {
        let games = self.games(table)?;
        let entries = self.genre_entries(&games);
        info!("Catalog cleaned: {} games, {} genre rows", games.len(), entries.len());
        Ok(entries)
    }

    /// Median revenue per genre over the first `per_genre_sample` games of
    /// each genre with outliers removed, highest median first.
    pub fn revenue_by_genre(&self, entries: &[GenreEntry]) -> Vec<GenreRevenue> {
        let mut stats: Vec<GenreRevenue> = group_revenue(entries, Some(self.config.per_genre_sample))
            .into_iter()
            .filter_map(|(genre, values)| {
                let kept = remove_outliers(&values);
                let sorted = sorted(&kept);
                Some(GenreRevenue {
                    genre,
                    games: sorted.len(),
                    q1: quantile(&sorted, 0.25)?,
                    median: quantile(&sorted, 0.5)?,
                    q3: quantile(&sorted, 0.75)?,
                })
            })
            .collect();
        stats.sort_by(|a, b| b.median.total_cmp(&a.median).then_with(|| a.genre.cmp(&b.genre)));
        stats
    }

    /// Share of games per genre reaching the revenue threshold, outliers
    /// removed, highest rate first.
    pub fn success_rate_by_genre(&self, entries: &[GenreEntry]) -> Vec<GenreSuccess> {
        let threshold = self.config.revenue_threshold;
        let mut rates: Vec<GenreSuccess> = group_revenue(entries, None)
            .into_iter()
            .filter_map(|(genre, values)| {
                let kept = remove_outliers(&values);
                if kept.is_empty() {
                    return None;
                }
                let hits = kept.iter().filter(|v| **v >= threshold).count();
                Some(GenreSuccess {
                    genre,
                    games: kept.len(),
                    success_rate: hits as f64 / kept.len() as f64 * 100.0,
                })
            })
            .collect();
        rates.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate).then_with(|| a.genre.cmp(&b.genre)));
        rates
    }
}

/// Genre list per app id, for joining reviews against the catalog.
pub fn genres_by_appid(entries: &[GenreEntry]) -> HashMap<u32, Vec<String>> {
    let mut map: HashMap<u32, Vec<String>> = HashMap::new();
    for entry in entries {
        if let Some(appid) = entry.appid {
            let genres = map.entry(appid).or_default();
            if !genres.contains(&entry.genre) {
                genres.push(entry.genre.clone());
            }
        }
    }
    map
}

fn top_genres(entries: &[GenreEntry], n: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.genre.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(g, _)| g.to_string()).collect()
}

fn group_revenue(entries: &[GenreEntry], limit: Option<usize>) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for entry in entries {
        let values = groups.entry(entry.genre.clone()).or_default();
        if limit.map_or(true, |l| values.len() < l) {
            values.push(entry.estimated_revenue);
        }
    }
    groups
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Drop values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`, keeping input order.
pub fn remove_outliers(values: &[f64]) -> Vec<f64> {
    let s = sorted(values);
    let (Some(q1), Some(q3)) = (quantile(&s, 0.25), quantile(&s, 0.75)) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    values.iter().copied().filter(|v| *v >= lower && *v <= upper).collect()
}

/// Pick scrape targets: poorly rated games with enough reviews, randomly
/// sampled.
pub fn select_targets(games: &[CatalogGame], selection: &SelectionConfig) -> Vec<ScrapeTarget> {
    let mut seen = HashSet::new();
    let candidates: Vec<ScrapeTarget> = games
        .iter()
        .filter(|g| g.review_score.map_or(false, |s| s < selection.max_review_score))
        .filter(|g| g.reviews_total >= selection.min_review_count)
        .filter_map(|g| g.appid.map(|id| ScrapeTarget::new(id, g.title.clone())))
        .filter(|t| seen.insert(t.appid))
        .collect();

    let amount = (candidates.len() as f64 * selection.sample_fraction).round() as usize;
    let mut rng = match selection.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sample: Vec<ScrapeTarget> = candidates.choose_multiple(&mut rng, amount).cloned().collect();
    info!("Selected {} of {} candidate games for scraping", sample.len(), candidates.len());
    sample
}

/// Lowercase, strip HTML tags, keep letters, digits, whitespace and `,.-`,
/// collapse whitespace.
pub fn clean_description(text: &str) -> String {
    let lower = text.to_lowercase();
    let without_tags = HTML_TAG.replace_all(&lower, "");
    let kept = DISALLOWED_DESCRIPTION_CHARS.replace_all(&without_tags, "");
    WHITESPACE_RUN.replace_all(&kept, " ").trim().to_string()
}

/// `"Action, RPG,Indie"` -> `"action rpg indie"`
pub fn clean_tags(tags: &str) -> String {
    tags.split(',')
        .map(|t| t.trim())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build the games data served by the analysis API from a raw store export.
pub fn preprocess_games(table: &CatalogTable, config: &PreprocessConfig) -> Result<Vec<GameEntry>, CatalogError> {
    let appid_col = table.column("appid")?;
    let name_col = table.column("name")?;
    let languages_col = table.column(&config.languages_column)?;
    let reviews_col = table.column(&config.total_reviews_column)?;
    let description_col = table.column(&config.description_column)?;
    let tags_col = table.column(&config.tags_column)?;
    let header_col = table.column("header_image_url").ok();
    let store_col = table.column("store_page_url").ok();

    let mut games = Vec::new();
    for row in table.rows() {
        if !field(row, languages_col).contains(config.required_language.as_str()) {
            continue;
        }
        if parse_count(field(row, reviews_col)).map_or(true, |n| n <= config.min_total_reviews) {
            continue;
        }
        let Ok(appid) = field(row, appid_col).parse::<u32>() else {
            continue;
        };

        let tags = field(row, tags_col);
        let combined_text = format!("{} {}", clean_description(field(row, description_col)), clean_tags(tags));
        games.push(GameEntry {
            appid,
            name: field(row, name_col).to_string(),
            combined_text,
            header_image_url: header_col.map(|c| field(row, c).to_string()).unwrap_or_default(),
            store_page_url: store_col.map(|c| field(row, c).to_string()).unwrap_or_default(),
            tags: tags.to_string(),
        });
    }
    info!("Preprocessed {} of {} games", games.len(), table.len());
    Ok(games)
}

pub fn write_games_data<W: Write>(writer: W, games: &[GameEntry]) -> Result<(), CatalogError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for game in games {
        csv_writer.serialize(game)?;
    }
    csv_writer.flush().map_err(|source| CatalogError::Io {
        path: PathBuf::from("<writer>"),
        source,
    })
}

pub fn read_games_data<R: Read>(reader: R) -> Result<Vec<GameEntry>, CatalogError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .collect::<Result<Vec<GameEntry>, _>>()
        .map_err(CatalogError::from)
}

#[cfg(test)]
mod tests;
