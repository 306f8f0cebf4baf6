use std::sync::Arc;

use {
    redwind_config::RedwindConfig,
    redwind_plugins::ExternalPostFetcher,
    redwind_posts::{PostStore, User, UserStore},
    sqlx::SqlitePool,
};

use crate::auth::CredentialStore;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RedwindConfig>,
    pub posts: PostStore,
    pub users: UserStore,
    pub credentials: Arc<CredentialStore>,
    /// Fetchers contributed by plugins, in registration order.
    pub fetchers: Arc<[Arc<dyn ExternalPostFetcher>]>,
}

impl AppState {
    /// Open the stores on `pool`, creating their tables.
    pub async fn new(config: Arc<RedwindConfig>, pool: SqlitePool) -> anyhow::Result<Self> {
        let posts = PostStore::new(pool.clone()).await?;
        let users = UserStore::new(pool.clone()).await?;
        let credentials = Arc::new(CredentialStore::new(pool, &config.auth).await?);
        Ok(Self {
            config,
            posts,
            users,
            credentials,
            fetchers: Arc::from(Vec::new()),
        })
    }

    #[must_use]
    pub fn with_fetchers(mut self, fetchers: Vec<Arc<dyn ExternalPostFetcher>>) -> Self {
        self.fetchers = Arc::from(fetchers);
        self
    }

    /// The site owner's user record.
    pub async fn owner(&self) -> redwind_posts::Result<User> {
        self.users.load_or_create(&self.config.auth.owner).await
    }
}
