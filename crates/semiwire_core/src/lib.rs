pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::ArticleStore;
pub use types::{Article, ArticleFilter, Page, QueryPolicy, DEFAULT_PAGE_LIMIT};
