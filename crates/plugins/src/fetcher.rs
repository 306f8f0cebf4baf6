use {
    async_trait::async_trait,
    redwind_posts::{Context, User},
};

/// Turns a remote permalink into a [`Context`] for reply and like display.
///
/// Implementations return `None` both for URLs they do not recognise and for
/// remote failures; callers try the next fetcher.
#[async_trait]
pub trait ExternalPostFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_external_post(&self, user: &User, source_url: &str) -> Option<Context>;
}
