use std::sync::Arc;

use {
    axum::{
        Extension, Form, Json, Router,
        extract::{Query, State},
        response::{IntoResponse, Redirect, Response},
        routing::{get, post},
    },
    redwind_gateway::{AppState, CurrentUser},
    redwind_posts::User,
    serde::Deserialize,
    tracing::{error, warn},
};

use crate::{Error, Result, client::TwitterClient};

/// Authorization and syndication routes. The client is handed to handlers
/// as a request extension.
pub fn router(client: Arc<TwitterClient>) -> Router<AppState> {
    Router::new()
        .route("/admin/authorize_twitter", get(authorize_twitter))
        .route("/admin/authorize_twitter2", get(authorize_twitter2))
        .route("/api/syndicate_to_twitter", post(syndicate_to_twitter))
        .route("/api/twitter/repost_preview", get(repost_preview))
        .layer(Extension(client))
}

async fn authorize_twitter(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(client): Extension<Arc<TwitterClient>>,
) -> Response {
    let callback_url = format!("{}/admin/authorize_twitter2", state.config.site.base_url());
    match client.authorize(&callback_url).await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            warn!(error = %e, "twitter authorization failed");
            e.to_string().into_response()
        },
    }
}

#[derive(Deserialize)]
struct CallbackQuery {
    oauth_token: Option<String>,
    oauth_verifier: Option<String>,
}

async fn authorize_twitter2(
    CurrentUser(mut user): CurrentUser,
    State(state): State<AppState>,
    Extension(client): Extension<Arc<TwitterClient>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let (Some(token), Some(verifier)) = (query.oauth_token, query.oauth_verifier) else {
        return "twitter authorization was not granted".into_response();
    };

    let result = async {
        client
            .complete_authorization(&mut user, &token, &verifier)
            .await?;
        state.users.save(&user).await?;
        Ok::<_, Error>(())
    }
    .await;

    match result {
        Ok(()) => Redirect::to("/settings").into_response(),
        Err(e) => {
            warn!(error = %e, "twitter authorization failed");
            e.to_string().into_response()
        },
    }
}

#[derive(Deserialize)]
struct SyndicateForm {
    post_id: Option<String>,
    tweet_preview: Option<String>,
}

async fn syndicate_to_twitter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Extension(client): Extension<Arc<TwitterClient>>,
    Form(form): Form<SyndicateForm>,
) -> Json<serde_json::Value> {
    match syndicate(&state, &client, &user, &form).await {
        Ok(status_id) => Json(serde_json::json!({
            "success": true,
            "twitter_status_id": status_id,
            "twitter_permalink": client.status_url(&status_id),
        })),
        Err(e) => {
            error!(post_id = ?form.post_id, error = %e, "posting to twitter");
            Json(serde_json::json!({
                "success": false,
                "error": format!("exception while syndicating to Twitter: {e}"),
            }))
        },
    }
}

async fn syndicate(
    state: &AppState,
    client: &TwitterClient,
    user: &User,
    form: &SyndicateForm,
) -> Result<String> {
    let post_id = form
        .post_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::message("missing post_id"))?;
    if !user.is_twitter_authorized() {
        return Err(Error::message(
            "twitter is not authorized; connect an account in settings",
        ));
    }

    let mut post = state.posts.writeable(post_id).await?;
    client
        .push(user, &mut post, form.tweet_preview.as_deref())
        .await?;
    post.save().await?;

    post.twitter_status_id.clone().ok_or(Error::MissingStatusId)
}

#[derive(Deserialize)]
struct PreviewQuery {
    url: String,
}

async fn repost_preview(
    CurrentUser(user): CurrentUser,
    Extension(client): Extension<Arc<TwitterClient>>,
    Query(query): Query<PreviewQuery>,
) -> Json<serde_json::Value> {
    let html = client.repost_preview(&user, &query.url).await;
    Json(serde_json::json!({ "html": html }))
}
