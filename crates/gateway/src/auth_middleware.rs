use {
    axum::{
        extract::{FromRef, FromRequestParts},
        http::{StatusCode, header, request::Parts},
        response::{IntoResponse, Json, Response},
    },
    redwind_posts::User,
    tracing::error,
};

use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "redwind_session";

/// Axum extractor for routes that need a logged-in owner. Validates the
/// session cookie and loads the owner's [`User`]; rejects with 401 otherwise.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = session_token(&parts.headers).ok_or_else(unauthorized)?;
        match state.credentials.validate_session(token).await {
            Ok(true) => {},
            Ok(false) => return Err(unauthorized()),
            Err(e) => {
                error!(error = %e, "session lookup failed");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            },
        }

        state.owner().await.map(CurrentUser).map_err(|e| {
            error!(error = %e, "failed to load owner");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "not authenticated"})),
    )
        .into_response()
}

pub(crate) fn session_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    parse_cookie(cookie_header, SESSION_COOKIE)
}

/// Parse a specific cookie value from a Cookie header string.
pub fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
        {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie() {
        assert_eq!(
            parse_cookie("redwind_session=abc123; other=def", "redwind_session"),
            Some("abc123")
        );
        assert_eq!(
            parse_cookie("other=def; redwind_session=xyz", "redwind_session"),
            Some("xyz")
        );
        assert_eq!(parse_cookie("redwind_session_old=1", "redwind_session"), None);
        assert_eq!(parse_cookie("", "redwind_session"), None);
    }
}
