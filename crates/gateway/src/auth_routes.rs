use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};

use crate::{
    auth_middleware::{SESSION_COOKIE, session_token},
    state::AppState,
};

/// Login and logout, mounted under `/api/auth`.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
}

#[derive(serde::Deserialize)]
struct LoginRequest {
    password: String,
}

async fn login_handler(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    if !state.credentials.has_password() {
        return (
            StatusCode::FORBIDDEN,
            "no password configured; set auth.password_hash",
        )
            .into_response();
    }
    if !state.credentials.verify_password(&body.password) {
        tracing::warn!("login rejected: invalid password");
        return (StatusCode::UNAUTHORIZED, "invalid password").into_response();
    }
    match state.credentials.create_session().await {
        Ok(token) => session_response(&token, state.config.auth.session_ttl_hours),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("session error: {e}"),
        )
            .into_response(),
    }
}

async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers)
        && let Err(e) = state.credentials.delete_session(token).await
    {
        tracing::warn!(error = %e, "failed to delete session");
    }
    clear_session_response()
}

fn session_response(token: &str, ttl_hours: u64) -> Response {
    let max_age = ttl_hours * 3600;
    // Lax: the cookie must survive the top-level redirect back from Twitter.
    let cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}

fn clear_session_response() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn set_cookie(resp: &Response) -> &str {
        resp.headers()
            .get(header::SET_COOKIE)
            .expect("response must set a cookie")
            .to_str()
            .expect("cookie header must be valid UTF-8")
    }

    #[test]
    fn session_cookie_carries_token_and_ttl() {
        let resp = session_response("tok", 2);
        let cookie = set_cookie(&resp);
        assert!(cookie.starts_with("redwind_session=tok;"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn logout_cookie_expires_session() {
        let resp = clear_session_response();
        assert!(set_cookie(&resp).contains("Max-Age=0"));
    }
}
