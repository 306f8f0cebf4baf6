use {
    tracing::{debug, warn},
    url::Url,
};

use crate::{
    Error, Result,
    session::OAuth1Session,
    signing::{OAuthParams, authorization_header},
    types::{OAuth1Config, TokenPair},
};

/// Drives the three-step OAuth 1.0a handshake against one provider and
/// hands out signed sessions once an access token is known.
#[derive(Debug, Clone)]
pub struct OAuth1Service {
    config: OAuth1Config,
    client: reqwest::Client,
}

impl OAuth1Service {
    pub fn new(config: OAuth1Config) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: OAuth1Config, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &OAuth1Config {
        &self.config
    }

    /// Step 1: obtain a temporary request token bound to `callback_url`.
    pub async fn get_request_token(&self, callback_url: &str) -> Result<TokenPair> {
        let url = parse_url(&self.config.request_token_url)?;
        let oauth = OAuthParams::generate().with("oauth_callback", callback_url);
        let header = authorization_header("POST", &url, &[], &self.config.consumer, None, &oauth)?;

        debug!(url = %url, "requesting OAuth request token");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await?;
        parse_token_response(resp).await
    }

    /// Step 2: the URL the user's browser must visit to approve the request token.
    pub fn authorize_url(&self, request_token: &str) -> Result<String> {
        let mut url = parse_url(&self.config.authorize_url)?;
        url.query_pairs_mut()
            .append_pair("oauth_token", request_token);
        Ok(url.to_string())
    }

    /// Step 3: exchange the approved request token and verifier for an access token.
    pub async fn get_access_token(
        &self,
        request_token: &TokenPair,
        verifier: &str,
    ) -> Result<TokenPair> {
        let url = parse_url(&self.config.access_token_url)?;
        let oauth = OAuthParams::generate().with("oauth_verifier", verifier);
        let header = authorization_header(
            "POST",
            &url,
            &[],
            &self.config.consumer,
            Some(request_token),
            &oauth,
        )?;

        debug!(url = %url, "exchanging OAuth verifier for access token");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await?;
        parse_token_response(resp).await
    }

    /// A session that signs every request with `access_token`.
    pub fn session(&self, access_token: TokenPair) -> Result<OAuth1Session> {
        let base_url = parse_url(&self.config.base_url)?;
        Ok(OAuth1Session::new(
            self.client.clone(),
            self.config.consumer.clone(),
            access_token,
            base_url,
        ))
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| Error::invalid_url(raw, source))
}

/// Token endpoints answer with `application/x-www-form-urlencoded` bodies.
async fn parse_token_response(resp: reqwest::Response) -> Result<TokenPair> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        warn!(status = %status, "OAuth token endpoint rejected request");
        return Err(Error::Status { status, body });
    }
    parse_token_body(&body)
}

pub(crate) fn parse_token_body(body: &str) -> Result<TokenPair> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {},
        }
    }
    match (token, secret) {
        (Some(token), Some(secret)) => Ok(TokenPair::new(token, secret)),
        _ => Err(Error::message(format!(
            "token response missing oauth_token or oauth_token_secret: {body}"
        ))),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_token_body() {
        let pair = parse_token_body(
            "oauth_token=NPcudxy0yU5T3tBzho7iCotZ3cnetKwcTIRlX0iwRl0&oauth_token_secret=veNRnAWe6inFuo8o2u8SLLZLjolYDmDP7SzL0YfYI&oauth_callback_confirmed=true",
        )
        .unwrap();
        assert_eq!(pair.token, "NPcudxy0yU5T3tBzho7iCotZ3cnetKwcTIRlX0iwRl0");
        assert_eq!(pair.secret(), "veNRnAWe6inFuo8o2u8SLLZLjolYDmDP7SzL0YfYI");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = parse_token_body("oauth_token=abc").unwrap_err();
        assert!(err.to_string().contains("missing oauth_token"));
    }
}
