/// Config schema types (server, site, database, auth, plugins, twitter).
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedwindConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub plugins: PluginsConfig,
    pub twitter: TwitterConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Public identity of the site, used to build permalinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical base URL, without a trailing slash.
    pub url: String,
    /// Base URL of the short-link domain, without a trailing slash.
    pub short_url: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".into(),
            short_url: "http://localhost:5000/s".into(),
            name: "Red Wind".into(),
        }
    }
}

impl SiteConfig {
    /// Site URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Short-link URL with any trailing slash removed.
    pub fn short_base_url(&self) -> &str {
        self.short_url.trim_end_matches('/')
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Relative paths are resolved against the data directory.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "redwind.db".into(),
        }
    }
}

/// Owner authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Argon2 PHC string produced by `redwind auth hash-password`.
    pub password_hash: Option<String>,
    /// Lifetime of a login session.
    pub session_ttl_hours: u64,
    /// Domain identifying the site owner in the users table.
    pub owner: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash: None,
            session_ttl_hours: 720,
            owner: "localhost".into(),
        }
    }
}

/// Which plugins to activate at startup, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    pub enabled: Vec<String>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["twitter".into()],
        }
    }
}

/// Twitter application credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: String,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub consumer_secret: Option<Secret<String>>,
    /// Screen name used to build status permalinks.
    pub username: Option<String>,
    pub api_base: String,
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorize_url: String,
    /// Timeout applied to every outbound request.
    pub timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: None,
            username: None,
            api_base: "https://api.twitter.com/1.1/".into(),
            request_token_url: "https://api.twitter.com/oauth/request_token".into(),
            access_token_url: "https://api.twitter.com/oauth/access_token".into(),
            authorize_url: "https://api.twitter.com/oauth/authorize".into(),
            timeout_secs: 30,
        }
    }
}

impl TwitterConfig {
    /// Both consumer credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty()
            && self
                .consumer_secret
                .as_ref()
                .is_some_and(|s| !s.expose_secret().is_empty())
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_twitter_only() {
        let cfg = RedwindConfig::default();
        assert_eq!(cfg.plugins.enabled, vec!["twitter".to_string()]);
        assert_eq!(cfg.server.port, 5000);
        assert!(!cfg.twitter.is_configured());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: RedwindConfig = toml::from_str(
            r#"
[site]
url = "https://kylewm.com/"
short_url = "http://kyl.im"

[twitter]
consumer_key = "key"
consumer_secret = "secret"
"#,
        )
        .unwrap();
        assert_eq!(cfg.site.base_url(), "https://kylewm.com");
        assert_eq!(cfg.site.short_base_url(), "http://kyl.im");
        assert_eq!(cfg.site.name, "Red Wind");
        assert!(cfg.twitter.is_configured());
        assert_eq!(cfg.twitter.api_base, "https://api.twitter.com/1.1/");
    }

    #[test]
    fn empty_secret_is_not_configured() {
        let cfg: TwitterConfig =
            toml::from_str("consumer_key = \"key\"\nconsumer_secret = \"\"").unwrap();
        assert!(!cfg.is_configured());
    }
}
