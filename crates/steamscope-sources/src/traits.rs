use async_trait::async_trait;
use steamscope_config::ReviewOrder;
use steamscope_models::ReviewsPage;
use crate::error::SourceError;

/// Initial cursor accepted by the `appreviews` endpoint.
pub const START_CURSOR: &str = "*";

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub language: String,
    pub cursor: String,
    pub num_per_page: u32,
    pub order: ReviewOrder,
}

impl PageQuery {
    pub fn first_page(language: impl Into<String>, num_per_page: u32, order: ReviewOrder) -> Self {
        Self {
            language: language.into(),
            cursor: START_CURSOR.to_string(),
            num_per_page,
            order,
        }
    }

    pub fn with_cursor(&self, cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            ..self.clone()
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("json", "1".to_string()),
            ("language", self.language.clone()),
            ("cursor", self.cursor.clone()),
            ("num_per_page", self.num_per_page.to_string()),
            ("filter", self.order.as_str().to_string()),
        ]
    }
}

/// A paginated review listing.
#[async_trait]
pub trait ReviewPageSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch one page. A page with `success != 1` is returned as-is; the
    /// caller decides what an upstream-reported failure means.
    async fn fetch_page(&self, appid: u32, query: &PageQuery) -> Result<ReviewsPage, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_params() {
        let query = PageQuery::first_page("english", 100, ReviewOrder::Recent);
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("json", "1".to_string()),
                ("language", "english".to_string()),
                ("cursor", "*".to_string()),
                ("num_per_page", "100".to_string()),
                ("filter", "recent".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_cursor_keeps_other_params() {
        let query = PageQuery::first_page("english", 50, ReviewOrder::All).with_cursor("AoJ4+x==");
        assert_eq!(query.cursor, "AoJ4+x==");
        assert_eq!(query.num_per_page, 50);
        assert_eq!(query.order, ReviewOrder::All);
    }
}
