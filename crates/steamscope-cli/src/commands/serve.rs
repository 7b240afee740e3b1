use crate::output::Output;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use color_eyre::Result;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use steamscope_config::Config;
use steamscope_core::{
    quality_predicate, AnalysisContext, AnalysisError, AnalysisSettings, Analyzer, AppState, GeminiSummarizer,
};
use steamscope_sources::{create_http_client, GeminiClient, SteamReviewsClient};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct Prompt {
    pub description: String,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn analyze_handler(State(state): State<AppState>, Json(prompt): Json<Prompt>) -> Response {
    match state.analyze(&prompt.description).await {
        Ok(result) => Json(result).into_response(),
        Err(AnalysisError::NotReady) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": AnalysisError::NotReady.to_string() })),
        )
            .into_response(),
        Err(e) => {
            error!("Analysis failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "ready": state.is_ready().await }))
}

/// Allow the configured origins; a trailing slash is ignored.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o.trim_end_matches('/'))
                .map_err(|e| color_eyre::eyre::eyre!("Invalid CORS origin '{}': {}", o, e))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

pub async fn run_serve(bind: Option<String>, games_data: Option<String>, config: Config, output: &Output) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let location = games_data.unwrap_or_else(|| config.server.games_data.clone());

    let client = create_http_client(&config.http)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    let source = Arc::new(SteamReviewsClient::with_client(client.clone(), config.http.store_base_url.clone()));
    let gemini = config
        .summarizer
        .resolve_api_key()
        .map(|key| GeminiClient::new(client.clone(), &config.summarizer, key));
    let mut analyzer = Analyzer::new(
        source,
        Arc::new(GeminiSummarizer::new(gemini)),
        AnalysisSettings::from(&config.server),
    );
    if config.server.filter_reviews {
        let predicate = quality_predicate(&config.quality_filter)
            .map_err(|e| color_eyre::eyre::eyre!("Invalid quality filter settings: {}", e))?;
        analyzer = analyzer.with_predicate(Arc::new(predicate));
    }
    let state = AppState::new(analyzer);

    let loader_state = state.clone();
    tokio::spawn(async move {
        match AnalysisContext::load(&location, &client).await {
            Ok(context) => {
                loader_state.set_context(context).await;
                info!("Server is ready");
            }
            Err(e) => error!("Could not load games data from {}: {}", location, e),
        }
    });

    let app = router(state, cors_layer(&config.server.allowed_origins)?);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to bind {}: {}", bind, e))?;
    output.success(format!("Listening on http://{}", bind));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
