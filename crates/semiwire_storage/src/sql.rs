//! Statement composition for the Postgres backend.
//!
//! Each supplied filter contributes an independent clause that pushes its
//! own bind arguments; placeholders are numbered by argument count, so no
//! clause needs to know what was pushed before it. Clauses are joined with
//! AND. Substring filters match literally: needles are escaped before being
//! wrapped into an ILIKE pattern.

use chrono::NaiveDate;

use semiwire_core::{ArticleFilter, Page, QueryPolicy};

/// Columns of every article projection, in `Article` field order.
pub(crate) const ARTICLE_COLUMNS: &str = "id, title, url, source, image_url, content, summary, \
     published_date, tags, major_category, minor_category, created_at, updated_at, \
     metadata_generated";

/// Published date descending with nulls last, ties broken by created date.
pub(crate) const ARTICLE_ORDER: &str = "published_date DESC NULLS LAST, created_at DESC";

pub(crate) const LIST_SOURCES: &str =
    "SELECT DISTINCT source FROM articles WHERE source IS NOT NULL ORDER BY source";

pub(crate) const LIST_TAGS: &str =
    "SELECT DISTINCT unnest(tags) AS tag FROM articles WHERE tags IS NOT NULL ORDER BY tag";

/// A bind argument traveling with the statement text, applied in push order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SqlArg {
    Text(String),
    Date(NaiveDate),
    Int(i64),
}

/// Compose the article listing statement for `filter`, `page` and `policy`.
pub(crate) fn list_articles_query(
    filter: &ArticleFilter,
    page: &Page,
    policy: &QueryPolicy,
) -> (String, Vec<SqlArg>) {
    let mut where_parts: Vec<String> = Vec::new();
    let mut args: Vec<SqlArg> = Vec::new();

    if policy.require_metadata {
        where_parts.push("metadata_generated = TRUE".to_string());
    }

    if let Some(source) = &filter.source {
        args.push(SqlArg::Text(source.clone()));
        where_parts.push(format!("source = ${}", args.len()));
    }

    if let Some(tag) = &filter.tag {
        args.push(SqlArg::Text(contains_pattern(tag)));
        where_parts.push(format!(
            "EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE t ILIKE ${} ESCAPE '!')",
            args.len()
        ));
    }

    if let Some(query) = &filter.query {
        let pattern = contains_pattern(query);
        args.push(SqlArg::Text(pattern.clone()));
        let title_ph = args.len();
        args.push(SqlArg::Text(pattern));
        let tags_ph = args.len();
        where_parts.push(format!(
            "(title ILIKE ${title_ph} ESCAPE '!' OR \
             EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE t ILIKE ${tags_ph} ESCAPE '!'))"
        ));
    }

    if let Some(date) = filter.date {
        args.push(SqlArg::Date(date));
        where_parts.push(format!("published_date::date = ${}", args.len()));
    }

    if let Some(major) = &filter.major_category {
        args.push(SqlArg::Text(major.clone()));
        where_parts.push(format!("major_category = ${}", args.len()));
    }

    if let Some(minor) = &filter.minor_category {
        args.push(SqlArg::Text(minor.clone()));
        where_parts.push(format!("minor_category = ${}", args.len()));
    }

    let mut statement = format!("SELECT {ARTICLE_COLUMNS} FROM articles");
    if !where_parts.is_empty() {
        statement.push_str(" WHERE ");
        statement.push_str(&where_parts.join(" AND "));
    }

    args.push(SqlArg::Int(i64::from(page.limit)));
    let limit_ph = args.len();
    args.push(SqlArg::Int(i64::from(page.offset)));
    let offset_ph = args.len();
    statement.push_str(&format!(
        " ORDER BY {ARTICLE_ORDER} LIMIT ${limit_ph} OFFSET ${offset_ph}"
    ));

    (statement, args)
}

pub(crate) fn get_article_query() -> String {
    format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1")
}

/// Wrap a needle into a `%needle%` ILIKE pattern matching it as a literal
/// substring: `%`, `_` and the escape character itself are escaped with `!`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        match c {
            '!' | '%' | '_' => {
                pattern.push('!');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern.push('%');
    pattern
}
