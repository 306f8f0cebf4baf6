use {reqwest::multipart, url::Url};

use crate::{
    Error, Result,
    signing::{OAuthParams, authorization_header},
    types::{ConsumerCredentials, TokenPair},
};

/// An authenticated API session. Every request carries a fresh OAuth 1.0a
/// `Authorization` header signed with the consumer and access-token secrets.
///
/// Responses are returned as-is; deciding what a non-2xx status means is up
/// to the caller.
#[derive(Debug, Clone)]
pub struct OAuth1Session {
    client: reqwest::Client,
    consumer: ConsumerCredentials,
    token: TokenPair,
    base_url: Url,
}

impl OAuth1Session {
    pub fn new(
        client: reqwest::Client,
        consumer: ConsumerCredentials,
        token: TokenPair,
        base_url: Url,
    ) -> Self {
        Self {
            client,
            consumer,
            token,
            base_url,
        }
    }

    /// Resolve an API path (e.g. `statuses/update.json`) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|source| Error::invalid_url(path, source))
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let header = self.header("GET", &url, &[])?;
        Ok(self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await?)
    }

    /// POST an `application/x-www-form-urlencoded` body. Body parameters are
    /// part of the signature.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;
        let header = self.header("POST", &url, form)?;
        Ok(self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .form(form)
            .send()
            .await?)
    }

    /// POST a `multipart/form-data` body. Only the OAuth protocol parameters
    /// are signed.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(String, String)],
        file_field: &str,
        file: multipart::Part,
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;
        let header = self.header("POST", &url, &[])?;

        let mut form = multipart::Form::new();
        for (key, value) in fields {
            form = form.text(key.clone(), value.clone());
        }
        form = form.part(file_field.to_string(), file);

        Ok(self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .multipart(form)
            .send()
            .await?)
    }

    fn header(&self, method: &str, url: &Url, body: &[(String, String)]) -> Result<String> {
        authorization_header(
            method,
            url,
            body,
            &self.consumer,
            Some(&self.token),
            &OAuthParams::generate(),
        )
    }
}
