//! Per-review acceptance: identifier novelty plus a pluggable quality
//! predicate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use steamscope_config::QualityFilterConfig;
use steamscope_models::RawReview;

/// Box-drawing, block and braille characters used by ASCII/Unicode art.
static BOX_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[┌┐└┘─│═║╔╗╚╝▄▀█▓░⠟⣛⠀⣿⠄]").expect("box character pattern is valid"));

/// Decides whether a review body is worth keeping.
///
/// The pagination driver only sees this trait, so the heuristic below can be
/// swapped for a learned classifier.
pub trait ReviewPredicate: Send + Sync {
    fn name(&self) -> &str;
    fn accepts(&self, review: &RawReview) -> bool;
}

/// Keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ReviewPredicate for AcceptAll {
    fn name(&self) -> &str {
        "accept_all"
    }

    fn accepts(&self, _review: &RawReview) -> bool {
        true
    }
}

/// Spam / ASCII-art heuristic. False positives and negatives are expected.
#[derive(Debug, Clone)]
pub struct HeuristicQualityFilter {
    max_words: usize,
    max_line_chars: usize,
    symbol_lines: usize,
    symbol_run: Regex,
}

impl HeuristicQualityFilter {
    pub fn new(config: &QualityFilterConfig) -> Result<Self, regex::Error> {
        let symbol_run = Regex::new(&format!(r"[#=*\-_/\\|<>]{{{},}}", config.symbol_run))?;
        Ok(Self {
            max_words: config.max_words,
            max_line_chars: config.max_line_chars,
            symbol_lines: config.symbol_lines,
            symbol_run,
        })
    }

    /// True when the text should be dropped.
    pub fn looks_like_bad_text(&self, text: &str) -> bool {
        if text.split_whitespace().count() > self.max_words {
            return true;
        }

        let mut symbol_heavy_lines = 0;
        for line in text.split('\n') {
            if line.chars().count() > self.max_line_chars {
                return true;
            }
            if BOX_CHARACTERS.is_match(line) {
                return true;
            }
            if self.symbol_run.is_match(line) {
                symbol_heavy_lines += 1;
            }
        }

        symbol_heavy_lines >= self.symbol_lines
    }
}

impl ReviewPredicate for HeuristicQualityFilter {
    fn name(&self) -> &str {
        "heuristic_quality"
    }

    fn accepts(&self, review: &RawReview) -> bool {
        !self.looks_like_bad_text(&review.review)
    }
}

/// Accepts only when every inner predicate accepts.
#[derive(Default)]
pub struct PredicateChain {
    predicates: Vec<Box<dyn ReviewPredicate>>,
}

impl PredicateChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: impl ReviewPredicate + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl ReviewPredicate for PredicateChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn accepts(&self, review: &RawReview) -> bool {
        self.predicates.iter().all(|p| p.accepts(review))
    }
}

/// Build the configured quality checks. With the filter disabled the chain
/// is empty and keeps everything.
pub fn quality_predicate(config: &QualityFilterConfig) -> Result<PredicateChain, regex::Error> {
    let chain = PredicateChain::new();
    if !config.enabled {
        return Ok(chain);
    }
    Ok(chain.with(HeuristicQualityFilter::new(config)?))
}

/// Identifiers seen in one review session.
#[derive(Debug, Default)]
pub struct SeenIds {
    ids: HashSet<String>,
}

impl SeenIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns false when it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
