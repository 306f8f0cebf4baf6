use std::sync::Arc;

use {
    async_trait::async_trait,
    redwind_gateway::AppState,
    redwind_plugins::{ExternalPostFetcher, PluginDescriptor, PluginHost},
    redwind_posts::{Context, User},
};

use crate::{Error, client::TwitterClient, routes};

pub const PLUGIN_NAME: &str = "twitter";

/// The Twitter plugin, for the bootstrap's plugin list.
pub fn descriptor() -> PluginDescriptor<AppState> {
    PluginDescriptor {
        name: PLUGIN_NAME,
        register: Some(register),
    }
}

fn register(host: &mut PluginHost<AppState>) -> redwind_plugins::Result<()> {
    let config = host.config();
    let client = TwitterClient::new(&config.twitter, &config.site, host.http().clone())
        .map_err(|e| match e {
            Error::NotConfigured => redwind_plugins::Error::not_configured(
                PLUGIN_NAME,
                "set twitter.consumer_key and twitter.consumer_secret",
            ),
            other => redwind_plugins::Error::external("failed to build twitter client", other),
        })?;
    let client = Arc::new(client);

    host.add_routes(routes::router(Arc::clone(&client)));
    host.add_fetcher(client);
    Ok(())
}

#[async_trait]
impl ExternalPostFetcher for TwitterClient {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn fetch_external_post(&self, user: &User, source_url: &str) -> Option<Context> {
        TwitterClient::fetch_external_post(self, user, source_url).await
    }
}
