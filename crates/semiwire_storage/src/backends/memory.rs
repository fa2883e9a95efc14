use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use semiwire_core::{Article, ArticleFilter, ArticleStore, Page, QueryPolicy, Result};

/// In-memory store with the same filter, ordering and facet semantics as the
/// Postgres backend. Backs tests and local runs without a database.
pub struct MemoryStore {
    articles: Arc<RwLock<Vec<Article>>>,
    policy: QueryPolicy,
}

impl MemoryStore {
    pub fn new(policy: QueryPolicy) -> Self {
        Self {
            articles: Arc::new(RwLock::new(Vec::new())),
            policy,
        }
    }

    pub fn with_articles(articles: Vec<Article>, policy: QueryPolicy) -> Self {
        Self {
            articles: Arc::new(RwLock::new(articles)),
            policy,
        }
    }

    /// Replace the stored articles. Seeding hook for tests and demos.
    pub async fn seed(&self, articles: Vec<Article>) {
        *self.articles.write().await = articles;
    }
}

fn matches(article: &Article, filter: &ArticleFilter, policy: &QueryPolicy) -> bool {
    if policy.require_metadata && !article.metadata_generated {
        return false;
    }
    if let Some(source) = &filter.source {
        if article.source != *source {
            return false;
        }
    }
    if let Some(tag) = &filter.tag {
        if !any_tag_contains(article, tag) {
            return false;
        }
    }
    if let Some(query) = &filter.query {
        let needle = query.to_lowercase();
        let in_title = article.title.to_lowercase().contains(&needle);
        if !in_title && !any_tag_contains(article, query) {
            return false;
        }
    }
    if let Some(date) = filter.date {
        if article.published_date.map(|d| d.date_naive()) != Some(date) {
            return false;
        }
    }
    if let Some(major) = &filter.major_category {
        if article.major_category.as_deref() != Some(major.as_str()) {
            return false;
        }
    }
    if let Some(minor) = &filter.minor_category {
        if article.minor_category.as_deref() != Some(minor.as_str()) {
            return false;
        }
    }
    true
}

fn any_tag_contains(article: &Article, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    article
        .tags
        .iter()
        .flatten()
        .any(|tag| tag.to_lowercase().contains(&needle))
}

/// Published date descending with nulls last, then created date descending.
fn article_order(a: &Article, b: &Article) -> Ordering {
    match (a.published_date, b.published_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn list_articles(&self, filter: &ArticleFilter, page: &Page) -> Result<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut matched: Vec<Article> = articles
            .iter()
            .filter(|article| matches(article, filter, &self.policy))
            .cloned()
            .collect();
        matched.sort_by(article_order);
        Ok(matched
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.iter().find(|article| article.id == id).cloned())
    }

    async fn list_sources(&self) -> Result<Vec<String>> {
        let articles = self.articles.read().await;
        let sources: BTreeSet<String> = articles.iter().map(|a| a.source.clone()).collect();
        Ok(sources.into_iter().collect())
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let articles = self.articles.read().await;
        let tags: BTreeSet<String> = articles
            .iter()
            .flat_map(|a| a.tags.iter().flatten().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
