use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

use crate::cache::SnapshotCache;
use crate::config::AppConfig;
use crate::scheduler::RefreshScheduler;

pub mod handlers;
pub mod responses;

pub use handlers::{force_refresh, get_category, get_snapshot, index_page};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SnapshotCache>,
    pub scheduler: Arc<RefreshScheduler>,
    pub config: AppConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // HTML view
        .route("/", get(index_page))
        // API routes
        .route("/api/stock", get(get_snapshot))
        .route("/api/stock/:category", get(get_category))
        .route("/api/refresh", get(force_refresh))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(
                            tower_http::trace::DefaultOnResponse::new().level(Level::INFO),
                        ),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "garden-stock"
    }))
}

pub async fn serve(config: AppConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!("Server starting on {}:{}", config.server.host, config.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmptyResultPolicy, SchedulerConfig, ServerConfig, SourceConfig};
    use crate::extract::SourceDocument;
    use crate::fetcher::{FetchError, StockFetcher};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    struct StaticFetcher {
        page: String,
    }

    #[async_trait]
    impl StockFetcher for StaticFetcher {
        async fn fetch(&self) -> Result<SourceDocument, FetchError> {
            Ok(SourceDocument::from_text(self.page.clone()))
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "localhost".to_string(),
                port: 5000,
            },
            source: SourceConfig {
                url: "http://localhost:5001/stock".to_string(),
                user_agent: "TestAgent/1.0".to_string(),
                request_timeout: 5,
            },
            scheduler: SchedulerConfig {
                refresh_interval_secs: 300,
                empty_result_policy: EmptyResultPolicy::Retain,
            },
        }
    }

    fn test_state(page: &str) -> AppState {
        let config = test_config();
        let cache = Arc::new(SnapshotCache::new());
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::new(StaticFetcher {
                page: page.to_string(),
            }),
            Arc::clone(&cache),
            config.scheduler.clone(),
        ));
        AppState {
            cache,
            scheduler,
            config,
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state("SEEDS\nCarrot x10"));
        let (status, body) = get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "garden-stock");
    }

    #[tokio::test]
    async fn test_stock_endpoint_serves_seed_before_first_refresh() {
        let app = create_router(test_state("SEEDS\nCarrot x10"));
        let (status, body) = get(app, "/api/stock").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"]["last_updated"].is_null());
        // Every category key is present even before data arrives.
        for label in ["SEEDS", "GEARS", "EGGS", "EVENT_SHOP", "COSMETICS"] {
            assert!(body["data"]["stock"]["categories"][label].is_array());
        }
    }

    #[tokio::test]
    async fn test_refresh_then_stock_roundtrip() {
        let state = test_state("SEEDS\nCarrot x10\nGEARS\nTrowel x1");
        let app = create_router(state.clone());

        let (status, body) = get(app.clone(), "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "updated");
        assert_eq!(body["data"]["items"], 2);

        let (status, body) = get(app, "/api/stock").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stock"]["categories"]["SEEDS"][0]["name"], "Carrot");
        assert!(!body["data"]["last_updated"].is_null());
    }

    #[tokio::test]
    async fn test_category_endpoint() {
        let state = test_state("SEEDS\nCarrot x10");
        state.scheduler.refresh_now().await;
        let app = create_router(state);

        let (status, body) = get(app.clone(), "/api/stock/seeds").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "SEEDS");
        assert_eq!(body["data"]["items"][0]["quantity"], 10);

        let (status, body) = get(app.clone(), "/api/stock/event-shop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

        let (status, body) = get(app, "/api/stock/mystery").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_index_page_renders_html() {
        let state = test_state("SEEDS\nCarrot x10");
        state.scheduler.refresh_now().await;
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("SEEDS"));
        assert!(html.contains("Carrot x10"));
    }
}
