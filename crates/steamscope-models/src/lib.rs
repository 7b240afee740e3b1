pub mod analysis;
pub mod game;
pub mod review;
pub mod time_window;
pub mod wire;

pub use analysis::{AnalysisResult, PredictedTag, ReviewSummary, SimilarGame};
pub use game::GameEntry;
pub use review::{ApiReview, ReviewRecord};
pub use time_window::TimeWindow;
pub use wire::{QuerySummary, RawAuthor, RawReview, ReviewsPage};
