use std::sync::Arc;

use semiwire_core::{ArticleStore, Error, QueryPolicy, Result};

pub mod backends;
mod sql;

pub use backends::memory::MemoryStore;

#[cfg(feature = "postgres")]
pub use backends::postgres::{EnvSecret, PgConfig, PostgresStore, SecretSource};

/// Build a store by backend name, as selected on the command line.
///
/// The postgres backend is configured from the environment and opens its
/// pool lazily on first use, so this never touches the network.
pub fn create_store(kind: &str, policy: QueryPolicy) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new(policy))),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = PostgresStore::from_env(Arc::new(EnvSecret), policy);
            Ok(Arc::new(store))
        }
        other => Err(Error::Config(format!("Unknown storage backend: {other}"))),
    }
}

pub mod prelude {
    pub use semiwire_core::{Article, ArticleFilter, ArticleStore, Page, QueryPolicy, Result};

    pub use super::backends::memory::MemoryStore;

    #[cfg(feature = "postgres")]
    pub use super::backends::postgres::PostgresStore;
}
