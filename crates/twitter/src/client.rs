use std::time::{Duration, Instant};

use {
    chrono::{DateTime, Utc},
    dashmap::DashMap,
    redwind_config::{SiteConfig, TwitterConfig},
    redwind_oauth::{ConsumerCredentials, OAuth1Config, OAuth1Service, OAuth1Session, TokenPair},
    redwind_posts::{
        Context, ContentFormat, Post, PostContext, User, autolink, download::download_resource,
        images::first_image,
    },
    regex::{NoExpand, Regex},
    reqwest::{StatusCode, header::LOCATION, multipart::Part},
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{
    Error, Result,
    types::{Oembed, StatusResponse, Tweet},
};

/// Upper bound on `HEAD` requests made while expanding one link.
pub const MAX_REDIRECT_HOPS: usize = 5;

/// Characters of title or body kept when no preview text is supplied; leaves
/// room for a space and a wrapped permalink within 140.
pub const STATUS_TEXT_LIMIT: usize = 116;

/// How long an unanswered authorization handshake keeps its request secret.
pub const PENDING_HANDSHAKE_TTL: Duration = Duration::from_secs(15 * 60);

/// Upper bound on handshakes awaiting their callback; the oldest is dropped
/// first.
pub const MAX_PENDING_HANDSHAKES: usize = 16;

const PERMALINK_PATTERN: &str = r"^https?://(?:www\.)?twitter\.com/(\w+)/status(?:es)?/(\w+)";

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Syndicates posts to Twitter and reads tweets back as [`Context`]s.
///
/// Built once at startup and shared behind an `Arc`. The only mutable state
/// is the set of request-token secrets for handshakes in flight, which is
/// bounded in size and age.
pub struct TwitterClient {
    service: OAuth1Service,
    http: reqwest::Client,
    /// Follows no redirects, so each hop of a short link is visible.
    head_client: reqwest::Client,
    site: SiteConfig,
    username: Option<String>,
    permalink_re: Regex,
    short_placeholder_re: Regex,
    site_placeholder_re: Regex,
    pending: DashMap<String, PendingHandshake>,
}

struct PendingHandshake {
    secret: Secret<String>,
    started: Instant,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig, site: &SiteConfig, http: reqwest::Client) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::NotConfigured);
        }
        let consumer_secret = config
            .consumer_secret
            .as_ref()
            .map(|s| s.expose_secret().clone())
            .unwrap_or_default();

        let service = OAuth1Service::with_client(
            OAuth1Config {
                consumer: ConsumerCredentials::new(config.consumer_key.clone(), consumer_secret),
                request_token_url: config.request_token_url.clone(),
                access_token_url: config.access_token_url.clone(),
                authorize_url: config.authorize_url.clone(),
                base_url: config.api_base.clone(),
            },
            http.clone(),
        );

        let head_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            service,
            http,
            head_client,
            site: site.clone(),
            username: config.username.clone().filter(|u| !u.is_empty()),
            permalink_re: Regex::new(PERMALINK_PATTERN)?,
            short_placeholder_re: placeholder_regex(site.short_base_url())?,
            site_placeholder_re: placeholder_regex(site.base_url())?,
            pending: DashMap::new(),
        })
    }

    // ── Authorization ────────────────────────────────────────────────────

    /// Start the handshake: obtain a request token and return the URL the
    /// browser must visit to approve it.
    pub async fn authorize(&self, callback_url: &str) -> Result<String> {
        let request_token = self.service.get_request_token(callback_url).await?;
        let url = self.service.authorize_url(&request_token.token)?;
        self.remember_handshake(
            request_token.token.clone(),
            request_token.secret.clone(),
            Instant::now(),
        );
        info!("twitter request token obtained, redirecting to authorize");
        Ok(url)
    }

    /// Finish the handshake and store the access token on `user`. The caller
    /// persists the user.
    pub async fn complete_authorization(
        &self,
        user: &mut User,
        oauth_token: &str,
        oauth_verifier: &str,
    ) -> Result<()> {
        let request_secret = self
            .pending
            .remove(oauth_token)
            .map(|(_, pending)| pending.secret.expose_secret().clone())
            .unwrap_or_default();
        let request_token = TokenPair::new(oauth_token, request_secret);

        let access = self
            .service
            .get_access_token(&request_token, oauth_verifier)
            .await?;
        user.set_twitter_credentials(access.token.clone(), access.secret().to_string());
        info!(domain = %user.domain, "twitter access token stored");
        Ok(())
    }

    /// Record a request secret until its callback arrives. Handshakes older
    /// than [`PENDING_HANDSHAKE_TTL`] are forgotten, and at most
    /// [`MAX_PENDING_HANDSHAKES`] are kept.
    fn remember_handshake(&self, token: String, secret: Secret<String>, now: Instant) {
        self.pending
            .retain(|_, p| now.saturating_duration_since(p.started) < PENDING_HANDSHAKE_TTL);
        while self.pending.len() >= MAX_PENDING_HANDSHAKES {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|entry| entry.value().started)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else { break };
            debug!("dropping oldest pending twitter handshake");
            self.pending.remove(&oldest);
        }
        self.pending.insert(token, PendingHandshake {
            secret,
            started: now,
        });
    }

    // ── Reading ──────────────────────────────────────────────────────────

    /// Remote status id of a tweet permalink.
    pub fn match_permalink<'a>(&self, url: &'a str) -> Option<&'a str> {
        self.permalink_re
            .captures(url)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
    }

    fn first_status_id<'a>(&self, contexts: &'a [PostContext]) -> Option<&'a str> {
        contexts
            .iter()
            .find_map(|ctx| self.match_permalink(&ctx.source))
    }

    fn session_for(&self, user: &User) -> Option<OAuth1Session> {
        let (token, secret) = user.twitter_credentials()?;
        match self.service.session(TokenPair::new(token, secret)) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "could not open twitter session");
                None
            },
        }
    }

    /// Fetch a tweet as a [`Context`]. `None` for URLs that are not tweet
    /// permalinks, for users without Twitter credentials, and for any remote
    /// failure.
    pub async fn fetch_external_post(&self, user: &User, source_url: &str) -> Option<Context> {
        let status_id = self.match_permalink(source_url)?;
        let session = self.session_for(user)?;

        let resp = match session
            .get(&format!("statuses/show/{status_id}.json"), &[])
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(source = source_url, error = %e, "failed to fetch tweet");
                return None;
            },
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(source = source_url, status = %status, body, "failed to fetch tweet");
            return None;
        }

        let tweet: Tweet = match resp.json().await {
            Ok(tweet) => tweet,
            Err(e) => {
                warn!(source = source_url, error = %e, "unreadable tweet");
                return None;
            },
        };

        Some(self.tweet_to_context(source_url, tweet).await)
    }

    async fn tweet_to_context(&self, source_url: &str, tweet: Tweet) -> Context {
        let pub_date = parse_created_at(&tweet.created_at);
        let author_url = match tweet.user.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => self.expand_link(url).await,
            None => format!("http://twitter.com/{}", tweet.user.screen_name),
        };
        let content = self.expand_links(&tweet.text).await;

        Context {
            source: source_url.to_string(),
            permalink: source_url.to_string(),
            reference: None,
            content,
            content_format: ContentFormat::Plain,
            author_name: tweet.user.name,
            author_url,
            author_image: tweet.user.profile_image_url,
            pub_date,
        }
    }

    /// Embeddable HTML for a tweet permalink, via `statuses/oembed`.
    pub async fn repost_preview(&self, user: &User, url: &str) -> Option<String> {
        let status_id = self.match_permalink(url)?;
        let session = self.session_for(user)?;

        let resp = session
            .get("statuses/oembed.json", &[("id", status_id)])
            .await
            .inspect_err(|e| warn!(url, error = %e, "oembed request failed"))
            .ok()?;
        if !resp.status().is_success() {
            warn!(url, status = %resp.status(), "oembed request rejected");
            return None;
        }
        let embed: Oembed = resp.json().await.ok()?;
        embed.html
    }

    // ── Link expansion ───────────────────────────────────────────────────

    /// Follow permanent redirects from `url`, at most [`MAX_REDIRECT_HOPS`]
    /// of them. Stops at the first response that is not a `301` with a
    /// `Location`, or at the first transport error, and returns the URL
    /// reached so far.
    pub async fn expand_link(&self, url: &str) -> String {
        let mut current = url.to_string();
        for _ in 0..MAX_REDIRECT_HOPS {
            debug!(url = %current, "expanding link");
            let resp = match self.head_client.head(&current).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(url = %current, error = %e, "link expansion stopped");
                    break;
                },
            };
            if resp.status() != StatusCode::MOVED_PERMANENTLY {
                break;
            }
            let Some(location) = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok())
            else {
                break;
            };
            current = resolve_location(&current, location);
            debug!(url = %current, "redirected");
        }
        current
    }

    /// Expand every link in `text`, leaving the rest untouched.
    pub async fn expand_links(&self, text: &str) -> String {
        autolink::replace_links_with(text, |url| async move { self.expand_link(&url).await })
            .await
    }

    // ── Writing ──────────────────────────────────────────────────────────

    /// Syndicate `post`: retweet when it shares a tweet, favorite when it
    /// likes one, otherwise publish a new status. Users without Twitter
    /// credentials are a no-op. On success the remote id is stored in
    /// `post.twitter_status_id`.
    pub async fn push(&self, user: &User, post: &mut Post, preview: Option<&str>) -> Result<()> {
        let Some((token, secret)) = user.twitter_credentials() else {
            debug!(shortid = %post.shortid, "user has not authorized twitter, not syndicating");
            return Ok(());
        };
        let session = self.service.session(TokenPair::new(token, secret))?;

        let resp = if let Some(status_id) = self.first_status_id(&post.share_contexts) {
            info!(shortid = %post.shortid, status_id, "retweeting");
            session
                .post_form(
                    &format!("statuses/retweet/{status_id}.json"),
                    &[("trim_user".into(), "true".into())],
                )
                .await?
        } else if let Some(status_id) = self.first_status_id(&post.like_contexts) {
            info!(shortid = %post.shortid, status_id, "favoriting");
            session
                .post_form(
                    "favorites/create.json",
                    &[
                        ("id".into(), status_id.to_string()),
                        ("trim_user".into(), "true".into()),
                    ],
                )
                .await?
        } else {
            self.post_status(&session, post, preview).await?
        };

        let status = resp.status();
        if !status.is_success() {
            let headers = resp.headers().clone();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status,
                headers,
                body,
            });
        }

        let result: StatusResponse = resp.json().await?;
        let status_id = result
            .id_str
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingStatusId)?;
        info!(shortid = %post.shortid, status_id = %status_id, "syndicated to twitter");
        post.twitter_status_id = Some(status_id);
        Ok(())
    }

    async fn post_status(
        &self,
        session: &OAuth1Session,
        post: &Post,
        preview: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut form: Vec<(String, String)> = vec![
            ("status".into(), self.create_status(post, preview)),
            ("trim_user".into(), "true".into()),
        ];
        if let Some(location) = post.location {
            form.push(("lat".into(), location.latitude.to_string()));
            form.push(("long".into(), location.longitude.to_string()));
        }
        if let Some(parent) = self.first_status_id(&post.reply_contexts) {
            form.push(("in_reply_to_status_id".into(), parent.to_string()));
        }

        let Some(image) = first_image(&post.content, post.content_format) else {
            info!(shortid = %post.shortid, "posting new status");
            return Ok(session.post_form("statuses/update.json", &form).await?);
        };

        let image_url = self.resolve_site_url(&image)?;
        let media = tempfile::NamedTempFile::new()?;
        download_resource(&self.http, image_url.as_str(), media.path()).await?;
        let bytes = tokio::fs::read(media.path()).await?;
        let part = Part::bytes(bytes).file_name(media_file_name(&image_url));

        info!(shortid = %post.shortid, image = %image_url, "posting new status with media");
        Ok(session
            .post_multipart("statuses/update_with_media.json", &form, "media[]", part)
            .await?)
    }

    /// Status text for a new tweet. A preview is used as-is apart from its
    /// placeholder links, which become the post's short link and permalink.
    /// Without one, the title (or body) is cut to [`STATUS_TEXT_LIMIT`]
    /// characters and the permalink appended.
    pub fn create_status(&self, post: &Post, preview: Option<&str>) -> String {
        match preview.filter(|p| !p.is_empty()) {
            Some(preview) => {
                let short = post.short_permalink(&self.site);
                let long = post.permalink(&self.site);
                let text = self
                    .short_placeholder_re
                    .replace_all(preview, NoExpand(&short));
                self.site_placeholder_re
                    .replace_all(&text, NoExpand(&long))
                    .into_owned()
            },
            None => {
                let text: String = post
                    .title_or_content()
                    .chars()
                    .take(STATUS_TEXT_LIMIT)
                    .collect();
                format!("{text} {}", post.permalink(&self.site))
            },
        }
    }

    /// Public permalink of a status.
    pub fn status_url(&self, status_id: &str) -> String {
        match &self.username {
            Some(username) => format!("https://twitter.com/{username}/status/{status_id}"),
            None => format!("https://twitter.com/i/web/status/{status_id}"),
        }
    }

    fn resolve_site_url(&self, src: &str) -> Result<Url> {
        let base = format!("{}/", self.site.base_url());
        let base = Url::parse(&base).map_err(|e| Error::invalid_url(base.clone(), e))?;
        base.join(src).map_err(|e| Error::invalid_url(src, e))
    }
}

/// `<base>/XXXX/XX/...`: the placeholder links a preview is drafted with.
fn placeholder_regex(base: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("{}/[X/]+", regex::escape(base)))?)
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_str(raw, CREATED_AT_FORMAT) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            debug!(created_at = raw, error = %e, "unparseable tweet timestamp");
            None
        },
    }
}

fn resolve_location(current: &str, location: &str) -> String {
    Url::parse(current)
        .and_then(|base| base.join(location))
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}

fn media_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("media")
        .to_string()
}
