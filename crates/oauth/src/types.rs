use secrecy::{ExposeSecret, Secret};

/// OAuth 1.0a service descriptor: consumer credentials plus fixed endpoints.
#[derive(Debug, Clone)]
pub struct OAuth1Config {
    pub consumer: ConsumerCredentials,
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorize_url: String,
    /// Base URL that API paths are joined onto. Must end with `/`.
    pub base_url: String,
}

/// Application (consumer) key and secret.
#[derive(Debug, Clone)]
pub struct ConsumerCredentials {
    pub key: String,
    pub secret: Secret<String>,
}

impl ConsumerCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Secret::new(secret.into()),
        }
    }
}

/// A token and its secret, either a temporary request token or an access token.
#[derive(Clone)]
pub struct TokenPair {
    pub token: String,
    pub secret: Secret<String>,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: Secret::new(secret.into()),
        }
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
