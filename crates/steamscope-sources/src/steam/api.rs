use reqwest::{Client, StatusCode};
use steamscope_models::ReviewsPage;
use tracing::{debug, warn};
use crate::error::SourceError;
use crate::traits::PageQuery;

pub fn review_page_url(base_url: &str, appid: u32) -> String {
    format!("{}/appreviews/{}", base_url.trim_end_matches('/'), appid)
}

/// Decode a response body. Anything that is not a JSON page object is a
/// decode failure.
pub fn decode_page(body: &[u8]) -> Result<ReviewsPage, SourceError> {
    Ok(serde_json::from_slice(body)?)
}

/// Request one page of reviews
pub async fn get_review_page(
    client: &Client,
    base_url: &str,
    appid: u32,
    query: &PageQuery,
) -> Result<ReviewsPage, SourceError> {
    let url = review_page_url(base_url, appid);
    debug!("GET {} cursor={}", url, query.cursor);

    let response = client
        .get(&url)
        .query(&query.to_params())
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("Failed to get review page for app {}: status {}", appid, status);
        return Err(SourceError::Status(status.as_u16()));
    }

    let body = response.bytes().await?;
    decode_page(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_page_url() {
        assert_eq!(
            review_page_url("https://store.steampowered.com/", 1245620),
            "https://store.steampowered.com/appreviews/1245620"
        );
    }

    #[test]
    fn test_decode_rejects_html() {
        let err = decode_page(b"<html>Access Denied</html>").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
        assert_eq!(err.category(), "decode");
    }

    #[test]
    fn test_decode_failure_page() {
        let page = decode_page(br#"{"success": 2}"#).unwrap();
        assert!(!page.is_success());
        assert!(page.reviews.is_empty());
    }
}
