pub mod analysis;
pub mod batch;
pub mod catalog;
pub mod criticism;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod progress;
pub mod session;
pub mod similarity;
pub mod stability;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::{AnalysisContext, AnalysisError, AnalysisSettings, Analyzer, AppState, GeminiSummarizer, Summarizer};
pub use batch::{scrape_batch, AppReport, BatchResult, ScrapeTarget, TargetParseError};
pub use catalog::{CatalogCleaner, CatalogError, CatalogTable};
pub use criticism::{analyze_reviews, CriticismReport, CriticismTagger};
pub use export::{export_reviews, load_reviews_csv, ExportError, ExportFormat};
pub use fetcher::fetch_all_reviews;
pub use filter::{quality_predicate, HeuristicQualityFilter, PredicateChain, ReviewPredicate};
pub use session::{ReviewSession, SessionOptions, SessionOutcome, Termination};
pub use stability::{evaluate_stability, StabilityError, StabilityReport};
