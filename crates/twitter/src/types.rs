//! Wire types for the Twitter REST API v1.1 responses we read.

use serde::Deserialize;

/// A status as returned by `statuses/show`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id_str: String,
    /// e.g. `Wed Aug 29 17:12:58 +0000 2012`.
    pub created_at: String,
    pub text: String,
    pub user: TweetUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetUser {
    pub name: String,
    pub screen_name: String,
    /// Profile link, usually a t.co short link.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// The part of a write response we keep. Retweet, favorite and update
/// endpoints all answer with a status object.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub id_str: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
}
