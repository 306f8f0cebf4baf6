use {
    chrono::{DateTime, Utc},
    redwind_config::SiteConfig,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Markup language of a post body or context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Markdown,
    Html,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A relationship to another piece of content, possibly remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContext {
    pub source: String,
}

impl PostContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A post authored on this site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub shortid: String,
    /// Path below the site URL, e.g. `2014/03/05/1`.
    pub path: String,
    pub title: Option<String>,
    pub content: String,
    pub content_format: ContentFormat,
    pub location: Option<Location>,
    /// Remote id of the status this post was syndicated as.
    pub twitter_status_id: Option<String>,
    pub share_contexts: Vec<PostContext>,
    pub like_contexts: Vec<PostContext>,
    pub reply_contexts: Vec<PostContext>,
}

impl Post {
    pub fn new(shortid: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            shortid: shortid.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn permalink(&self, site: &SiteConfig) -> String {
        format!("{}/{}", site.base_url(), self.path.trim_start_matches('/'))
    }

    pub fn short_permalink(&self, site: &SiteConfig) -> String {
        format!("{}/{}", site.short_base_url(), self.shortid)
    }

    /// Title when set and non-empty, otherwise the body.
    pub fn title_or_content(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.content)
    }
}

/// Normalized view of an external post, used for previews and reply/like
/// display. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub source: String,
    pub permalink: String,
    pub reference: Option<String>,
    pub content: String,
    pub content_format: ContentFormat,
    pub author_name: String,
    pub author_url: String,
    pub author_image: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
}

/// The site owner and their per-service credentials.
#[derive(Clone, Default)]
pub struct User {
    pub domain: String,
    pub twitter_oauth_token: Option<Secret<String>>,
    pub twitter_oauth_token_secret: Option<Secret<String>>,
}

impl User {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Access token and secret, when both are present and non-empty.
    pub fn twitter_credentials(&self) -> Option<(&str, &str)> {
        let token = self.twitter_oauth_token.as_ref()?.expose_secret();
        let secret = self.twitter_oauth_token_secret.as_ref()?.expose_secret();
        if token.is_empty() || secret.is_empty() {
            return None;
        }
        Some((token.as_str(), secret.as_str()))
    }

    pub fn is_twitter_authorized(&self) -> bool {
        self.twitter_credentials().is_some()
    }

    pub fn set_twitter_credentials(&mut self, token: String, secret: String) {
        self.twitter_oauth_token = Some(Secret::new(token));
        self.twitter_oauth_token_secret = Some(Secret::new(secret));
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("domain", &self.domain)
            .field("twitter_authorized", &self.is_twitter_authorized())
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            url: "https://kylewm.com/".into(),
            short_url: "http://kyl.im".into(),
            name: "Kyle".into(),
        }
    }

    #[test]
    fn permalinks_join_site_urls() {
        let post = Post::new("4fa1", "/2014/03/05/1");
        assert_eq!(post.permalink(&site()), "https://kylewm.com/2014/03/05/1");
        assert_eq!(post.short_permalink(&site()), "http://kyl.im/4fa1");
    }

    #[test]
    fn empty_title_falls_back_to_content() {
        let mut post = Post::new("a", "a");
        post.content = "body".into();
        assert_eq!(post.title_or_content(), "body");
        post.title = Some(String::new());
        assert_eq!(post.title_or_content(), "body");
        post.title = Some("  ".into());
        assert_eq!(post.title_or_content(), "  ");
        post.title = Some("Hello World".into());
        assert_eq!(post.title_or_content(), "Hello World");
    }

    #[test]
    fn user_needs_both_token_halves() {
        let mut user = User::new("kylewm.com");
        assert!(!user.is_twitter_authorized());
        user.twitter_oauth_token = Some(Secret::new("t".into()));
        assert!(!user.is_twitter_authorized());
        user.twitter_oauth_token_secret = Some(Secret::new(String::new()));
        assert!(!user.is_twitter_authorized());
        user.set_twitter_credentials("t".into(), "s".into());
        assert_eq!(user.twitter_credentials(), Some(("t", "s")));
        assert!(!format!("{user:?}").contains("\"s\""));
    }

    #[test]
    fn post_json_tolerates_missing_fields() {
        let post: Post = serde_json::from_str(r#"{"shortid":"x","path":"p"}"#).unwrap();
        assert_eq!(post.content_format, ContentFormat::Markdown);
        assert!(post.share_contexts.is_empty());
    }
}
