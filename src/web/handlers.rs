use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, Item, StockSnapshot, WeatherState};
use crate::scheduler::{RefreshOutcome, RefreshStatus};
use crate::web::responses::{ApiResponse, AppError};
use crate::web::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub stock: StockSnapshot,
    pub weather: WeatherState,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub items: Vec<Item>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// GET /api/stock returns the whole current snapshot. During a source
/// outage this keeps serving the last good data; staleness is visible only
/// through `last_updated`.
pub async fn get_snapshot(State(state): State<AppState>) -> Json<ApiResponse<SnapshotResponse>> {
    let record = state.cache.read().await;
    Json(ApiResponse::success(SnapshotResponse {
        stock: record.snapshot.clone(),
        weather: record.weather.clone(),
        last_updated: record.fetched_at,
    }))
}

/// GET /api/stock/:category returns the items for one category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<CategoryResponse>>, AppError> {
    let category = Category::from_query_name(&name)
        .ok_or_else(|| AppError::not_found(format!("Category '{name}'")))?;

    let record = state.cache.read().await;
    Ok(Json(ApiResponse::success(CategoryResponse {
        category,
        items: record.snapshot.items(category).to_vec(),
        last_updated: record.fetched_at,
    })))
}

/// GET /api/refresh triggers an out-of-band cycle and reports its outcome.
pub async fn force_refresh(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<RefreshOutcome>>) {
    let outcome = state.scheduler.refresh_now().await;
    let status = match outcome.status {
        RefreshStatus::Updated | RefreshStatus::Retained => StatusCode::OK,
        RefreshStatus::Busy => StatusCode::CONFLICT,
        RefreshStatus::Failed => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ApiResponse::success(outcome)))
}

/// GET / renders a minimal HTML view of the current snapshot.
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let record = state.cache.read().await;

    let mut sections = String::new();
    for category in Category::ALL {
        sections.push_str(&format!("<h2>{}</h2>\n<ul>\n", category.label()));
        let items = record.snapshot.items(category);
        if items.is_empty() {
            sections.push_str("<li class=\"empty\">No items</li>\n");
        }
        for item in items {
            sections.push_str(&format!(
                "<li>{} x{}</li>\n",
                escape_html(&item.name),
                item.quantity
            ));
        }
        sections.push_str("</ul>\n");
    }

    sections.push_str("<h2>WEATHER</h2>\n<ul>\n");
    match &record.weather.current {
        Some(current) => sections.push_str(&format!(
            "<li><strong>{}</strong> (current)</li>\n",
            escape_html(current)
        )),
        None => sections.push_str("<li class=\"empty\">No current weather</li>\n"),
    }
    for entry in &record.weather.recent {
        let time = entry.time.as_deref().unwrap_or("");
        sections.push_str(&format!(
            "<li>{} {}</li>\n",
            escape_html(&entry.condition),
            escape_html(time)
        ));
    }
    sections.push_str("</ul>\n");

    let last_updated = record
        .fetched_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Grow a Garden - Stock</title>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        h2 {{ border-bottom: 1px solid #ddd; }}
        li.empty {{ color: #888; }}
    </style>
</head>
<body>
    <h1>Grow a Garden Stock</h1>
    <p>Last updated: {last_updated}</p>
    {sections}
    <p><a href="/api/stock">JSON</a> | <a href="/api/refresh">Refresh</a></p>
</body>
</html>"#
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
