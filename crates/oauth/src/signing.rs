//! RFC 5849 HMAC-SHA1 signatures.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    hmac::{Hmac, Mac},
    sha1::Sha1,
    url::{Position, Url},
};

use crate::{
    Error, Result,
    types::{ConsumerCredentials, TokenPair},
};

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Per-request protocol values: nonce, timestamp, and any extra `oauth_*`
/// parameters (`oauth_callback`, `oauth_verifier`).
#[derive(Debug, Clone)]
pub struct OAuthParams {
    pub nonce: String,
    pub timestamp: u64,
    pub extra: Vec<(String, String)>,
}

impl OAuthParams {
    /// Fresh nonce and current timestamp.
    pub fn generate() -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }
}

/// Percent-encode per RFC 3986: everything except `A-Za-z0-9-._~`.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the signature base string.
///
/// `params` must contain every parameter that participates in the signature:
/// the `oauth_*` protocol parameters, query parameters, and form body
/// parameters. Query parameters already present on `url` are added here.
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            url.query_pairs()
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
        )
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_uri = &url[..Position::AfterPath];

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_uri),
        percent_encode(&normalized)
    )
}

/// HMAC-SHA1 of `base` keyed by the encoded consumer and token secrets.
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::message(format!("invalid signing key: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Compute the `Authorization: OAuth ...` header value for a request.
///
/// `body_params` are the form-encoded body parameters; pass an empty slice
/// for multipart bodies, whose fields never participate in the signature.
pub fn authorization_header(
    method: &str,
    url: &Url,
    body_params: &[(String, String)],
    consumer: &ConsumerCredentials,
    token: Option<&TokenPair>,
    oauth: &OAuthParams,
) -> Result<String> {
    use secrecy::ExposeSecret;

    let mut protocol: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), consumer.key.clone()),
        ("oauth_nonce".into(), oauth.nonce.clone()),
        ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
        ("oauth_timestamp".into(), oauth.timestamp.to_string()),
        ("oauth_version".into(), OAUTH_VERSION.into()),
    ];
    if let Some(token) = token {
        protocol.push(("oauth_token".into(), token.token.clone()));
    }
    protocol.extend(oauth.extra.iter().cloned());

    let all: Vec<(String, String)> = protocol
        .iter()
        .chain(body_params.iter())
        .cloned()
        .collect();
    let base = signature_base_string(method, url, &all);
    let signature = sign(
        &base,
        consumer.secret.expose_secret(),
        token.map(TokenPair::secret).unwrap_or(""),
    )?;
    protocol.push(("oauth_signature".into(), signature));
    protocol.sort();

    let fields = protocol
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}
