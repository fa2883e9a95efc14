use std::sync::Arc;

use semiwire_core::ArticleStore;

pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
}
