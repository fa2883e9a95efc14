use async_trait::async_trait;

use crate::types::{Article, ArticleFilter, Page};
use crate::Result;

/// Read-only access to the article table.
///
/// Every call is an independent read against shared connections and is safe
/// to issue concurrently; no call depends on state left by a previous one.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// List articles matching `filter`, ordered by published date descending
    /// with nulls last, ties broken by created date descending, windowed by
    /// `page`. An empty result is not an error.
    async fn list_articles(&self, filter: &ArticleFilter, page: &Page) -> Result<Vec<Article>>;

    /// Look up a single article by id. Absence is `Ok(None)`, not an error.
    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    /// All distinct source labels across the whole table, ascending.
    async fn list_sources(&self) -> Result<Vec<String>>;

    /// All distinct tag strings across the whole table, ascending.
    async fn list_tags(&self) -> Result<Vec<String>>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<()>;

    /// Release any held connections. Calls after close may fail.
    async fn close(&self) {}
}
