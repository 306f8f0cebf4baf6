use {
    secrecy::{ExposeSecret, Secret},
    sqlx::SqlitePool,
    tracing::info,
};

use crate::{Result, models::User};

/// Users and their per-service OAuth credentials.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                domain TEXT PRIMARY KEY,
                twitter_oauth_token TEXT,
                twitter_oauth_token_secret TEXT,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&store.pool)
        .await?;
        Ok(store)
    }

    pub async fn load(&self, domain: &str) -> Result<Option<User>> {
        let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT domain, twitter_oauth_token, twitter_oauth_token_secret
             FROM users WHERE domain = ?",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(domain, token, secret)| User {
            domain,
            twitter_oauth_token: token.map(Secret::new),
            twitter_oauth_token_secret: secret.map(Secret::new),
        }))
    }

    /// Load a user, creating an empty record on first access.
    pub async fn load_or_create(&self, domain: &str) -> Result<User> {
        if let Some(user) = self.load(domain).await? {
            return Ok(user);
        }
        let user = User::new(domain);
        self.save(&user).await?;
        info!(domain, "created user record");
        Ok(user)
    }

    pub async fn save(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (domain, twitter_oauth_token, twitter_oauth_token_secret)
             VALUES (?, ?, ?)
             ON CONFLICT(domain) DO UPDATE SET
                twitter_oauth_token = excluded.twitter_oauth_token,
                twitter_oauth_token_secret = excluded.twitter_oauth_token_secret,
                updated_at = datetime('now')",
        )
        .bind(&user.domain)
        .bind(user.twitter_oauth_token.as_ref().map(|s| s.expose_secret().clone()))
        .bind(
            user.twitter_oauth_token_secret
                .as_ref()
                .map(|s| s.expose_secret().clone()),
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
