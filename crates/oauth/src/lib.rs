//! OAuth 1.0a (RFC 5849) client: HMAC-SHA1 request signing, the three-step
//! token handshake, and signed API sessions.

pub mod error;
pub mod service;
pub mod session;
pub mod signing;
pub mod types;

pub use {
    error::{Error, Result},
    service::OAuth1Service,
    session::OAuth1Session,
    signing::{OAuthParams, authorization_header, percent_encode, signature_base_string},
    types::{ConsumerCredentials, OAuth1Config, TokenPair},
};
