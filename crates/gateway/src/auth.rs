use {
    argon2::{
        Argon2,
        password_hash::{
            PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
        },
    },
    redwind_config::AuthConfig,
    sqlx::SqlitePool,
    tracing::warn,
};

/// Owner password check and login sessions.
///
/// The password itself lives in configuration as an argon2 PHC string; only
/// session tokens are stored in the database.
pub struct CredentialStore {
    pool: SqlitePool,
    password_hash: Option<String>,
    session_ttl_hours: u64,
}

impl CredentialStore {
    pub async fn new(pool: SqlitePool, config: &AuthConfig) -> anyhow::Result<Self> {
        let store = Self {
            pool,
            password_hash: config.password_hash.clone(),
            session_ttl_hours: config.session_ttl_hours,
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                token TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check `password` against the configured hash. Always false when no
    /// hash is configured.
    pub fn verify_password(&self, password: &str) -> bool {
        match &self.password_hash {
            Some(hash) => verify_password(password, hash),
            None => false,
        }
    }

    // ── Sessions ─────────────────────────────────────────────────────────

    pub async fn create_session(&self) -> anyhow::Result<String> {
        let token = generate_token();
        sqlx::query("INSERT INTO auth_sessions (token, expires_at) VALUES (?, datetime('now', ?))")
            .bind(&token)
            .bind(format!("+{} hours", self.session_ttl_hours))
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    /// True if the token exists and has not expired.
    pub async fn validate_session(&self, token: &str) -> anyhow::Result<bool> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT token FROM auth_sessions WHERE token = ? AND expires_at > datetime('now')",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cleanup_expired_sessions(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Argon2 PHC string for `password`, suitable for `auth.password_hash`.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash_str: &str) -> bool {
    let parsed = match PasswordHash::new(hash_str) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "auth.password_hash is not a valid PHC string");
            return false;
        },
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn generate_token() -> String {
    use {base64::Engine, rand::RngCore};

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn store(password: Option<&str>, ttl_hours: u64) -> CredentialStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let config = AuthConfig {
            password_hash: password.map(|p| hash_password(p).unwrap()),
            session_ttl_hours: ttl_hours,
            ..AuthConfig::default()
        };
        CredentialStore::new(pool, &config).await.unwrap()
    }

    #[tokio::test]
    async fn verifies_configured_password() {
        let store = store(Some("correct horse"), 1).await;
        assert!(store.has_password());
        assert!(store.verify_password("correct horse"));
        assert!(!store.verify_password("battery staple"));
    }

    #[tokio::test]
    async fn no_password_rejects_everything() {
        let store = store(None, 1).await;
        assert!(!store.has_password());
        assert!(!store.verify_password(""));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("x", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let store = store(Some("pw"), 1).await;
        let token = store.create_session().await.unwrap();
        assert!(store.validate_session(&token).await.unwrap());
        assert!(!store.validate_session("bogus").await.unwrap());

        store.delete_session(&token).await.unwrap();
        assert!(!store.validate_session(&token).await.unwrap());
    }

    #[tokio::test]
    async fn zero_ttl_sessions_expire_immediately() {
        let store = store(Some("pw"), 0).await;
        let token = store.create_session().await.unwrap();
        assert!(!store.validate_session(&token).await.unwrap());
        assert_eq!(store.cleanup_expired_sessions().await.unwrap(), 1);
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/'));
    }
}
