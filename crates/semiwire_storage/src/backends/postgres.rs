use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use tokio::sync::OnceCell;
use tracing::info;

use semiwire_core::{Article, ArticleFilter, ArticleStore, Error, Page, QueryPolicy, Result};

use crate::sql::{self, SqlArg};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves the database password. Deployments inject their own resolver;
/// the store never sees where the secret came from.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn db_password(&self) -> Result<String>;
}

/// Reads `DB_PASSWORD` from the environment.
pub struct EnvSecret;

#[async_trait]
impl SecretSource for EnvSecret {
    async fn db_password(&self) -> Result<String> {
        std::env::var("DB_PASSWORD")
            .map_err(|_| Error::Config("DB_PASSWORD is not set".to_string()))
    }
}

/// Connection parameters without the password.
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
}

impl PgConfig {
    /// Read connection parameters from the environment. `DB_SOCKET` (a unix
    /// socket directory, as used behind Cloud SQL) wins over `DB_HOST`.
    pub fn from_env() -> Self {
        let host = std::env::var("DB_SOCKET")
            .or_else(|_| std::env::var("DB_HOST"))
            .unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432);
        let user = std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
        let database = std::env::var("DB_NAME").unwrap_or_else(|_| "semiwire".to_string());
        Self {
            host,
            port,
            user,
            database,
        }
    }
}

pub struct PostgresStore {
    config: PgConfig,
    secrets: Arc<dyn SecretSource>,
    policy: QueryPolicy,
    pool: OnceCell<PgPool>,
}

impl PostgresStore {
    pub fn new(config: PgConfig, secrets: Arc<dyn SecretSource>, policy: QueryPolicy) -> Self {
        Self {
            config,
            secrets,
            policy,
            pool: OnceCell::new(),
        }
    }

    pub fn from_env(secrets: Arc<dyn SecretSource>, policy: QueryPolicy) -> Self {
        Self::new(PgConfig::from_env(), secrets, policy)
    }

    /// The pool is created on first use so the process can start without a
    /// reachable database. Concurrent first callers share one initialization.
    async fn pool(&self) -> Result<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let password = self.secrets.db_password().await?;
                info!(
                    "Creating database pool: database={}, user={}, host={}",
                    self.config.database, self.config.user, self.config.host
                );
                let options = PgConnectOptions::new()
                    .host(&self.config.host)
                    .port(self.config.port)
                    .username(&self.config.user)
                    .database(&self.config.database)
                    .password(&password);
                let pool = PgPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .idle_timeout(IDLE_TIMEOUT)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        Error::Database(format!("Failed to create database pool: {}", e))
                    })?;
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .map_err(|e| Error::Database(format!("Connection test failed: {}", e)))?;
                info!("Database connection established");
                Ok(pool)
            })
            .await
    }
}

fn bind_args<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &'q [SqlArg],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Text(s) => query.bind(s.as_str()),
            SqlArg::Date(d) => query.bind(*d),
            SqlArg::Int(n) => query.bind(*n),
        };
    }
    query
}

fn article_from_row(row: &PgRow) -> std::result::Result<Article, sqlx::Error> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        source: row.try_get("source")?,
        image_url: row.try_get("image_url")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        published_date: row.try_get("published_date")?,
        tags: row.try_get("tags")?,
        major_category: row.try_get("major_category")?,
        minor_category: row.try_get("minor_category")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        metadata_generated: row.try_get("metadata_generated")?,
    })
}

#[async_trait]
impl ArticleStore for PostgresStore {
    async fn list_articles(&self, filter: &ArticleFilter, page: &Page) -> Result<Vec<Article>> {
        let pool = self.pool().await?;
        let (statement, args) = sql::list_articles_query(filter, page, &self.policy);
        let rows = bind_args(sqlx::query(&statement), &args)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch articles: {}", e)))?;
        rows.iter()
            .map(|row| {
                article_from_row(row)
                    .map_err(|e| Error::Database(format!("Failed to decode article row: {}", e)))
            })
            .collect()
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let pool = self.pool().await?;
        let statement = sql::get_article_query();
        let row = sqlx::query(&statement)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch article {}: {}", id, e)))?;
        match row {
            Some(row) => Ok(Some(article_from_row(&row).map_err(|e| {
                Error::Database(format!("Failed to decode article row: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn list_sources(&self) -> Result<Vec<String>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(sql::LIST_SOURCES)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch sources: {}", e)))?;
        rows.iter()
            .map(|row| {
                row.try_get("source")
                    .map_err(|e| Error::Database(format!("Failed to decode source row: {}", e)))
            })
            .collect()
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(sql::LIST_TAGS)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch tags: {}", e)))?;
        rows.iter()
            .map(|row| {
                row.try_get("tag")
                    .map_err(|e| Error::Database(format!("Failed to decode tag row: {}", e)))
            })
            .collect()
    }

    async fn ping(&self) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| Error::Database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}
