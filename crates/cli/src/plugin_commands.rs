//! CLI commands for inspecting compiled-in plugins.

use {
    clap::Subcommand,
    redwind_config::RedwindConfig,
    redwind_gateway::AppState,
    redwind_plugins::PluginDescriptor,
    redwind_twitter::plugin::PLUGIN_NAME,
};

#[derive(Subcommand)]
pub enum PluginAction {
    /// List compiled-in plugins and whether the config enables them.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_plugins(
    action: PluginAction,
    config: &RedwindConfig,
    plugins: &[PluginDescriptor<AppState>],
) -> anyhow::Result<()> {
    match action {
        PluginAction::List { json } => {
            let enabled = |name: &str| config.plugins.enabled.iter().any(|e| e == name);

            if json {
                let entries: Vec<serde_json::Value> = plugins
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "name": p.name,
                            "enabled": enabled(p.name),
                            "has_register": p.register.is_some(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            for plugin in plugins {
                let status = if enabled(plugin.name) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("  {:<12} {status}", plugin.name);
            }
            for name in &config.plugins.enabled {
                if !plugins.iter().any(|p| p.name == name.as_str()) {
                    println!("  {name:<12} unknown (listed in config, not compiled in)");
                }
            }
            if plugins.iter().any(|p| p.name == PLUGIN_NAME) && !config.twitter.is_configured() {
                println!("\n  {PLUGIN_NAME}: consumer_key/consumer_secret are not set");
            }
            Ok(())
        },
    }
}
