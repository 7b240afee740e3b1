use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use steamscope_config::HttpConfig;
use steamscope_models::ReviewsPage;
use crate::error::SourceError;
use crate::steam::api;
use crate::traits::{PageQuery, ReviewPageSource};

/// Build the shared HTTP client. Every request is bounded by the configured
/// timeout.
pub fn create_http_client(config: &HttpConfig) -> Result<Client, SourceError> {
    Ok(Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?)
}

#[derive(Clone)]
pub struct SteamReviewsClient {
    client: Arc<Client>,
    base_url: String,
}

impl SteamReviewsClient {
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(create_http_client(config)?, config.store_base_url.clone()))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReviewPageSource for SteamReviewsClient {
    fn source_name(&self) -> &str {
        "steam"
    }

    async fn fetch_page(&self, appid: u32, query: &PageQuery) -> Result<ReviewsPage, SourceError> {
        api::get_review_page(&self.client, &self.base_url, appid, query).await
    }
}
