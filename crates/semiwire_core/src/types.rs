use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `articles` table. Rows are created and enriched by the
/// upstream ingestion pipeline; this service only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub image_url: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub major_category: Option<String>,
    pub minor_category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata_generated: bool,
}

/// Listing criteria. Every field is optional: an omitted field drops its
/// predicate entirely, supplied predicates are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Exact, case-sensitive match on `source`.
    pub source: Option<String>,
    /// Case-insensitive substring match against any element of `tags`.
    pub tag: Option<String>,
    /// Case-insensitive substring match against the title or any tag.
    pub query: Option<String>,
    /// Calendar-date match on the date portion of `published_date`, compared
    /// in the storage timezone (UTC).
    pub date: Option<NaiveDate>,
    /// Exact match on `major_category`.
    pub major_category: Option<String>,
    /// Exact match on `minor_category`.
    pub minor_category: Option<String>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Pagination window over the ordered, filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Deployment-level listing policy, distinct from caller criteria.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPolicy {
    /// Only list rows whose enrichment has completed
    /// (`metadata_generated = TRUE`). Off by default; facet queries ignore
    /// this either way.
    pub require_metadata: bool,
}
