use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use semiwire_core::{Article, ArticleFilter, Page, DEFAULT_PAGE_LIMIT};

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesResponse {
    articles: Vec<Article>,
    has_more: bool,
    next_offset: u32,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (filter, page) = match parse_list_params(&params) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };

    match state.store.list_articles(&filter, &page).await {
        Ok(articles) => {
            // hasMore is a hint: true whenever the page came back full.
            let has_more = articles.len() == page.limit as usize;
            let next_offset = page.offset.saturating_add(articles.len() as u32);
            Json(ArticlesResponse {
                articles,
                has_more,
                next_offset,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to fetch articles: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch articles" })),
            )
                .into_response()
        }
    }
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_article(&id).await {
        Ok(Some(article)) => Json(article).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Article not found" })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch article {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch article" })),
            )
                .into_response()
        }
    }
}

/// Filter facets degrade to empty rather than failing the page.
pub async fn list_sources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_sources().await {
        Ok(sources) => Json(sources),
        Err(e) => {
            warn!("Failed to fetch sources: {}", e);
            Json(Vec::new())
        }
    }
}

pub async fn list_tags(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_tags().await {
        Ok(tags) => Json(tags),
        Err(e) => {
            warn!("Failed to fetch tags: {}", e);
            Json(Vec::new())
        }
    }
}

/// Empty-string values count as absent, so a form that submits blank inputs
/// gets the unfiltered listing.
fn parse_list_params(params: &HashMap<String, String>) -> Result<(ArticleFilter, Page), String> {
    let date = match non_empty(params, "date") {
        Some(raw) => Some(
            raw.parse::<NaiveDate>()
                .map_err(|_| "Invalid date parameter".to_string())?,
        ),
        None => None,
    };

    let filter = ArticleFilter {
        source: non_empty(params, "source"),
        tag: non_empty(params, "tag"),
        query: non_empty(params, "q"),
        date,
        major_category: non_empty(params, "major_category"),
        minor_category: non_empty(params, "minor_category"),
    };

    let limit = match non_empty(params, "limit") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| "Invalid limit parameter".to_string())?,
        None => DEFAULT_PAGE_LIMIT,
    };
    let offset = match non_empty(params, "offset") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| "Invalid offset parameter".to_string())?,
        None => 0,
    };

    Ok((filter, Page { limit, offset }))
}

fn non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|value| !value.is_empty()).cloned()
}
