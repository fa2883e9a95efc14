use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use semiwire_core::{
    Article, ArticleFilter, ArticleStore, Error, Page, QueryPolicy, Result,
};
use semiwire_storage::MemoryStore;
use semiwire_web::{create_app, AppState};

fn dt(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn article(id: &str, source: &str, tags: &[&str], published: Option<&str>) -> Article {
    Article {
        id: id.to_string(),
        title: format!("Article {id}"),
        url: format!("https://news.example.com/{id}"),
        source: source.to_string(),
        image_url: None,
        content: None,
        summary: None,
        published_date: published.map(dt),
        tags: if tags.is_empty() {
            None
        } else {
            Some(tags.iter().map(|t| t.to_string()).collect())
        },
        major_category: None,
        minor_category: None,
        created_at: dt("2025-01-01T00:00:00Z"),
        updated_at: dt("2025-01-01T00:00:00Z"),
        metadata_generated: true,
    }
}

fn dataset() -> Vec<Article> {
    vec![
        article("a", "Reuters", &["fab", "AI"], Some("2025-02-01T09:00:00Z")),
        article("b", "Nikkei", &["fab"], Some("2025-01-01T09:00:00Z")),
        article("c", "Reuters", &[], None),
    ]
}

async fn app_with(articles: Vec<Article>) -> Router {
    let store = MemoryStore::with_articles(articles, QueryPolicy::default());
    create_app(AppState {
        store: Arc::new(store),
    })
    .await
}

struct FailingStore;

#[async_trait]
impl ArticleStore for FailingStore {
    async fn list_articles(&self, _filter: &ArticleFilter, _page: &Page) -> Result<Vec<Article>> {
        Err(Error::Database("connection refused".to_string()))
    }

    async fn get_article(&self, _id: &str) -> Result<Option<Article>> {
        Err(Error::Database("connection refused".to_string()))
    }

    async fn list_sources(&self) -> Result<Vec<String>> {
        Err(Error::Database("connection refused".to_string()))
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        Err(Error::Database("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Err(Error::Database("connection refused".to_string()))
    }
}

async fn failing_app() -> Router {
    create_app(AppState {
        store: Arc::new(FailingStore),
    })
    .await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

fn listed_ids(body: &Value) -> Vec<&str> {
    body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn listing_wraps_articles_in_the_paging_envelope() {
    let app = app_with(dataset()).await;
    let (status, body) = get_json(&app, "/api/articles").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_ids(&body), vec!["a", "b", "c"]);
    assert_eq!(body["hasMore"], Value::Bool(false));
    assert_eq!(body["nextOffset"], 3);

    // Article objects keep their storage field names.
    let first = &body["articles"][0];
    assert_eq!(first["source"], "Reuters");
    assert!(first.get("published_date").is_some());
    assert_eq!(first["metadata_generated"], Value::Bool(true));
}

#[tokio::test]
async fn filters_combine_to_narrow_the_listing() {
    let app = app_with(dataset()).await;

    let (status, body) = get_json(&app, "/api/articles?source=Reuters").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_ids(&body), vec!["a", "c"]);

    let (_, body) = get_json(&app, "/api/articles?tag=fab").await;
    assert_eq!(listed_ids(&body), vec!["a", "b"]);

    let (_, body) = get_json(&app, "/api/articles?source=Reuters&tag=fab").await;
    assert_eq!(listed_ids(&body), vec!["a"]);

    let (_, body) = get_json(&app, "/api/articles?q=article").await;
    assert_eq!(listed_ids(&body), vec!["a", "b", "c"]);

    let (_, body) = get_json(&app, "/api/articles?date=2025-01-01").await;
    assert_eq!(listed_ids(&body), vec!["b"]);
}

#[tokio::test]
async fn blank_query_parameters_are_ignored() {
    let app = app_with(dataset()).await;
    let (status, body) =
        get_json(&app, "/api/articles?source=&tag=&q=&date=&limit=&offset=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_ids(&body), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn full_pages_advance_the_cursor() {
    let app = app_with(dataset()).await;

    let (_, body) = get_json(&app, "/api/articles?limit=2").await;
    assert_eq!(listed_ids(&body), vec!["a", "b"]);
    assert_eq!(body["hasMore"], Value::Bool(true));
    assert_eq!(body["nextOffset"], 2);

    let (_, body) = get_json(&app, "/api/articles?limit=2&offset=2").await;
    assert_eq!(listed_ids(&body), vec!["c"]);
    assert_eq!(body["hasMore"], Value::Bool(false));
    assert_eq!(body["nextOffset"], 3);
}

#[tokio::test]
async fn malformed_parameters_get_a_400() {
    let app = app_with(dataset()).await;

    let (status, body) = get_json(&app, "/api/articles?date=January").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date parameter");

    let (status, _) = get_json(&app, "/api/articles?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/articles?offset=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn article_lookup_finds_by_id_or_404s() {
    let app = app_with(dataset()).await;

    let (status, body) = get_json(&app, "/api/articles/b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "b");
    assert_eq!(body["source"], "Nikkei");

    let (status, body) = get_json(&app, "/api/articles/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Article not found");
}

#[tokio::test]
async fn backend_failures_become_opaque_500s() {
    let app = failing_app().await;

    let (status, body) = get_json(&app, "/api/articles").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch articles");

    let (status, body) = get_json(&app, "/api/articles/a").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch article");
}

#[tokio::test]
async fn facet_failures_degrade_to_empty_lists() {
    let app = failing_app().await;

    let (status, body) = get_json(&app, "/api/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));

    let (status, body) = get_json(&app, "/api/tags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn facets_enumerate_distinct_values() {
    let app = app_with(dataset()).await;

    let (_, body) = get_json(&app, "/api/sources").await;
    assert_eq!(body, serde_json::json!(["Nikkei", "Reuters"]));

    let (_, body) = get_json(&app, "/api/tags").await;
    assert_eq!(body, serde_json::json!(["AI", "fab"]));
}

#[tokio::test]
async fn cors_headers_allow_any_origin() {
    let app = app_with(dataset()).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles")
                .header(header::ORIGIN, "https://semiwire.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );
}
