//! API server wiring: state, router, and startup.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use shinbun_core::FeedAggregator;
use shinbun_core::config::ShinbunConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::handlers::{api_health, api_releases};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<FeedAggregator>,
}

/// Builds the router over an existing aggregator.
pub fn app_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/releases", get(api_releases))
        .route("/api/health", get(api_health))
        .layer(cors)
        .with_state(state)
}

/// Builds the production aggregator and serves it until shutdown.
pub async fn run_server(config: ShinbunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .user_agent(config.fetch.user_agent)
        .timeout(config.fetch.request_timeout)
        .build()?;

    let state = AppState {
        aggregator: Arc::new(FeedAggregator::from_config(&config, client)),
    };
    let router = app_router(state, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
