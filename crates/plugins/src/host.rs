use std::{collections::HashSet, sync::Arc};

use {
    axum::Router,
    redwind_config::RedwindConfig,
    serde::Serialize,
    tracing::{info, warn},
};

use crate::{Result, fetcher::ExternalPostFetcher};

/// Startup hook of a plugin. Runs once, before the server starts accepting
/// requests.
pub type RegisterFn<S> = fn(&mut PluginHost<S>) -> Result<()>;

/// A compiled-in plugin. `register` is optional: a plugin that only exists to
/// be listed (or whose hook was compiled out) is skipped at startup.
pub struct PluginDescriptor<S> {
    pub name: &'static str,
    pub register: Option<RegisterFn<S>>,
}

impl<S> Clone for PluginDescriptor<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            register: self.register,
        }
    }
}

impl<S> std::fmt::Debug for PluginDescriptor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("has_register", &self.register.is_some())
            .finish()
    }
}

/// What plugins see while registering: the loaded configuration, the shared
/// HTTP client, and the places they can contribute routes and fetchers to.
/// `S` is the state type of the routes they add.
pub struct PluginHost<S> {
    config: Arc<RedwindConfig>,
    http: reqwest::Client,
    router: Router<S>,
    fetchers: Vec<Arc<dyn ExternalPostFetcher>>,
}

impl<S> PluginHost<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(config: Arc<RedwindConfig>, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            router: Router::new(),
            fetchers: Vec::new(),
        }
    }

    pub fn config(&self) -> &RedwindConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Merge plugin routes into the application router.
    pub fn add_routes(&mut self, routes: Router<S>) {
        let router = std::mem::take(&mut self.router);
        self.router = router.merge(routes);
    }

    pub fn add_fetcher(&mut self, fetcher: Arc<dyn ExternalPostFetcher>) {
        info!(fetcher = fetcher.name(), "external post fetcher registered");
        self.fetchers.push(fetcher);
    }

    pub fn fetchers(&self) -> &[Arc<dyn ExternalPostFetcher>] {
        &self.fetchers
    }

    /// Routes and fetchers contributed by the registered plugins.
    pub fn into_parts(self) -> (Router<S>, Vec<Arc<dyn ExternalPostFetcher>>) {
        (self.router, self.fetchers)
    }
}

/// Outcome of [`register_plugins`], one entry per enabled name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginReport {
    pub registered: Vec<String>,
    /// Known plugins without a register hook.
    pub skipped: Vec<String>,
    /// Plugins whose hook returned an error, with the error text.
    pub failed: Vec<(String, String)>,
    pub unknown: Vec<String>,
}

/// Run the register hook of every enabled plugin, in `enabled` order.
///
/// Nothing here is fatal: unknown names, missing hooks and failing hooks are
/// logged and recorded in the report, and the remaining plugins still run.
pub fn register_plugins<S>(
    host: &mut PluginHost<S>,
    available: &[PluginDescriptor<S>],
    enabled: &[String],
) -> PluginReport
where
    S: Clone + Send + Sync + 'static,
{
    let mut report = PluginReport::default();
    let mut seen = HashSet::new();

    for name in enabled {
        if !seen.insert(name.as_str()) {
            warn!(plugin = %name, "plugin listed twice, ignoring repeat");
            continue;
        }

        let Some(descriptor) = available.iter().find(|d| d.name == name.as_str()) else {
            warn!(plugin = %name, "unknown plugin, skipping");
            report.unknown.push(name.clone());
            continue;
        };

        let Some(register) = descriptor.register else {
            info!(plugin = %name, "plugin has no register hook, skipping");
            report.skipped.push(name.clone());
            continue;
        };

        match register(host) {
            Ok(()) => {
                info!(plugin = %name, "plugin registered");
                report.registered.push(name.clone());
            },
            Err(e) => {
                warn!(plugin = %name, error = %e, "plugin registration failed");
                report.failed.push((name.clone(), e.to_string()));
            },
        }
    }

    report
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::Error,
        async_trait::async_trait,
        axum::{body::Body, http::Request, routing::get},
        redwind_posts::{Context, ContentFormat, User},
        tower::ServiceExt,
    };

    struct EchoFetcher;

    #[async_trait]
    impl ExternalPostFetcher for EchoFetcher {
        fn name(&self) -> &str {
            "echo"
        }

        async fn fetch_external_post(&self, _user: &User, source_url: &str) -> Option<Context> {
            source_url.starts_with("https://echo.example/").then(|| Context {
                source: source_url.into(),
                permalink: source_url.into(),
                reference: None,
                content: "echo".into(),
                content_format: ContentFormat::Plain,
                author_name: "Echo".into(),
                author_url: "https://echo.example".into(),
                author_image: None,
                pub_date: None,
            })
        }
    }

    fn register_echo(host: &mut PluginHost<()>) -> Result<()> {
        host.add_routes(Router::new().route("/echo/ping", get(|| async { "pong" })));
        host.add_fetcher(Arc::new(EchoFetcher));
        Ok(())
    }

    fn register_broken(host: &mut PluginHost<()>) -> Result<()> {
        if host.config().twitter.is_configured() {
            return Ok(());
        }
        Err(Error::not_configured("broken", "consumer key missing"))
    }

    fn available() -> Vec<PluginDescriptor<()>> {
        vec![
            PluginDescriptor {
                name: "echo",
                register: Some(register_echo),
            },
            PluginDescriptor {
                name: "listed",
                register: None,
            },
            PluginDescriptor {
                name: "broken",
                register: Some(register_broken),
            },
        ]
    }

    fn host() -> PluginHost<()> {
        PluginHost::new(Arc::new(RedwindConfig::default()), reqwest::Client::new())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn registered_plugin_contributes_routes_and_fetchers() {
        let mut host = host();
        let report = register_plugins(&mut host, &available(), &names(&["echo"]));
        assert_eq!(report.registered, vec!["echo"]);

        let user = User::new("kylewm.com");
        let fetched = host.fetchers()[0]
            .fetch_external_post(&user, "https://echo.example/1")
            .await
            .unwrap();
        assert_eq!(fetched.author_name, "Echo");

        let (router, fetchers) = host.into_parts();
        assert_eq!(fetchers.len(), 1);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/echo/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn missing_hook_failing_hook_and_unknown_name_are_not_fatal() {
        let mut host = host();
        let report = register_plugins(
            &mut host,
            &available(),
            &names(&["listed", "broken", "nope", "echo"]),
        );
        assert_eq!(report.skipped, vec!["listed"]);
        assert_eq!(report.unknown, vec!["nope"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(report.failed[0].1.contains("consumer key missing"));
        assert_eq!(report.registered, vec!["echo"]);
    }

    #[test]
    fn repeated_name_registers_once() {
        let mut host = host();
        let report = register_plugins(&mut host, &available(), &names(&["echo", "echo"]));
        assert_eq!(report.registered, vec!["echo"]);
        assert_eq!(host.fetchers().len(), 1);
    }

    #[test]
    fn report_serializes_for_listing() {
        let report = PluginReport {
            registered: names(&["twitter"]),
            ..PluginReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["registered"][0], "twitter");
    }
}
