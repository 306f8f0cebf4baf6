use reqwest::{StatusCode, header::HeaderMap};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("twitter consumer key and secret are not configured")]
    NotConfigured,

    #[error(transparent)]
    OAuth(#[from] redwind_oauth::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Posts(#[from] redwind_posts::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Twitter answered a write with a non-2xx status.
    #[error("status code: {status}, headers: {headers:?}, body: {body}")]
    Remote {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    #[error("response did not include a status id")]
    MissingStatusId,

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
