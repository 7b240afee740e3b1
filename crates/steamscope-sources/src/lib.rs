pub mod error;
pub mod gemini;
pub mod steam;
pub mod traits;

pub use error::SourceError;
pub use gemini::GeminiClient;
pub use steam::client::create_http_client;
pub use steam::SteamReviewsClient;
pub use traits::{PageQuery, ReviewPageSource, START_CURSOR};
