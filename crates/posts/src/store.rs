use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use {
    dashmap::DashMap,
    sqlx::SqlitePool,
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::debug,
};

use crate::{Error, Result, models::Post};

/// SQLite-backed post storage.
///
/// Posts are stored as JSON documents keyed by short id. Mutation goes
/// through [`PostStore::writeable`], which serializes writers per post.
#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PostStore {
    /// Create a new store and initialize tables.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = Self {
            pool,
            locks: Arc::new(DashMap::new()),
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                shortid TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or replace a post.
    pub async fn save(&self, post: &Post) -> Result<()> {
        let data = serde_json::to_string(post)?;
        sqlx::query(
            "INSERT INTO posts (shortid, path, data) VALUES (?, ?, ?)
             ON CONFLICT(shortid) DO UPDATE SET
                path = excluded.path,
                data = excluded.data,
                updated_at = datetime('now')",
        )
        .bind(&post.shortid)
        .bind(&post.path)
        .bind(data)
        .execute(&self.pool)
        .await?;
        debug!(shortid = %post.shortid, "post saved");
        Ok(())
    }

    pub async fn load(&self, shortid: &str) -> Result<Option<Post>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM posts WHERE shortid = ?")
            .bind(shortid)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| serde_json::from_str(&data).map_err(Error::from))
            .transpose()
    }

    pub async fn load_by_path(&self, path: &str) -> Result<Option<Post>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM posts WHERE path = ?")
            .bind(path.trim_matches('/'))
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| serde_json::from_str(&data).map_err(Error::from))
            .transpose()
    }

    /// Acquire exclusive write access to a post.
    ///
    /// The returned guard derefs to the post; call [`WriteablePost::save`]
    /// to persist changes. Other writers for the same post wait until the
    /// guard is dropped.
    pub async fn writeable(&self, shortid: &str) -> Result<WriteablePost> {
        let lock = self
            .locks
            .entry(shortid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;

        let post = self
            .load(shortid)
            .await?
            .ok_or_else(|| Error::post_not_found(shortid))?;

        Ok(WriteablePost {
            post,
            store: self.clone(),
            _guard: guard,
        })
    }
}

/// A post held under its per-post write lock.
pub struct WriteablePost {
    post: Post,
    store: PostStore,
    _guard: OwnedMutexGuard<()>,
}

impl WriteablePost {
    pub async fn save(&self) -> Result<()> {
        self.store.save(&self.post).await
    }

    /// Release the lock and return the post.
    pub fn into_inner(self) -> Post {
        self.post
    }
}

impl Deref for WriteablePost {
    type Target = Post;

    fn deref(&self) -> &Post {
        &self.post
    }
}

impl DerefMut for WriteablePost {
    fn deref_mut(&mut self) -> &mut Post {
        &mut self.post
    }
}
