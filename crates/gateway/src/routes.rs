use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{auth_middleware::CurrentUser, state::AppState};

pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Syndication state of the owner account.
pub(crate) async fn settings_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "domain": user.domain,
        "twitter_authorized": user.is_twitter_authorized(),
    }))
}

#[derive(serde::Deserialize)]
pub(crate) struct FetchContextQuery {
    url: String,
}

/// Ask each registered fetcher in turn; the first one that recognises the
/// URL wins.
pub(crate) async fn fetch_context_handler(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<FetchContextQuery>,
) -> impl IntoResponse {
    for fetcher in state.fetchers.iter() {
        if let Some(context) = fetcher.fetch_external_post(&user, &query.url).await {
            tracing::debug!(fetcher = fetcher.name(), url = %query.url, "context fetched");
            return Json(serde_json::json!({ "context": context }));
        }
    }
    Json(serde_json::json!({ "context": null }))
}
