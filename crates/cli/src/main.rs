mod auth_commands;
mod plugin_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    redwind_gateway::AppState,
    redwind_plugins::PluginDescriptor,
    tracing::info,
    tracing_appender::{
        non_blocking::{NonBlocking, WorkerGuard},
        rolling::{RollingFileAppender, Rotation},
    },
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Rotated log files kept next to the active one.
const LOG_FILES_KEPT: usize = 5;

#[derive(Parser)]
#[command(name = "redwind", about = "Red Wind: a personal publishing platform")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Also write logs to this file, rotated daily (e.g. `logs/app.log`).
    #[arg(long, global = true, env = "REDWIND_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/redwind/).
    #[arg(long, global = true, env = "REDWIND_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default when no subcommand is provided).
    Gateway,
    /// Plugin inspection.
    Plugins {
        #[command(subcommand)]
        action: plugin_commands::PluginAction,
    },
    /// Owner password and session management.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
}

/// Plugins compiled into this binary. `plugins.enabled` selects among them.
fn available_plugins() -> Vec<PluginDescriptor<AppState>> {
    vec![redwind_twitter::descriptor()]
}

/// Daily-rotated log file in the parent directory of `path`, named after its
/// stem and extension. Returns the writer and the guard that flushes it.
fn log_file_writer(path: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("redwind");
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(LOG_FILES_KEPT);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        builder = builder.filename_suffix(ext);
    }
    let appender = builder.build(dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. The returned guard must live as long as
/// logging should reach the log file.
fn init_telemetry(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let (file_layer, guard) = match &cli.log_file {
        Some(path) => {
            let (writer, guard) = log_file_writer(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_telemetry(&cli)?;

    if let Some(ref dir) = cli.config_dir {
        redwind_config::set_config_dir(dir.clone());
    }

    match cli.command {
        None | Some(Commands::Gateway) => {
            info!(version = env!("CARGO_PKG_VERSION"), "redwind starting");
            let mut config = redwind_config::discover_and_load();
            if let Some(bind) = cli.bind {
                config.server.bind = bind;
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            redwind_gateway::start_gateway(config, &available_plugins()).await
        },
        Some(Commands::Plugins { action }) => {
            let config = redwind_config::discover_and_load();
            plugin_commands::handle_plugins(action, &config, &available_plugins())
        },
        Some(Commands::Auth { action }) => auth_commands::handle_auth(action).await,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn log_file_is_created_under_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let (mut writer, guard) = log_file_writer(&logs.join("app.log")).unwrap();
        writer.write_all(b"redwind starting\n").unwrap();
        drop(guard);

        let files: Vec<PathBuf> = std::fs::read_dir(&logs)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("app.") && name.ends_with(".log"), "{name}");
        assert_eq!(
            std::fs::read_to_string(&files[0]).unwrap(),
            "redwind starting\n"
        );
    }

    #[test]
    fn log_file_flag_is_parsed() {
        let cli = Cli::try_parse_from(["redwind", "--log-file", "logs/app.log"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/app.log")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn hash_password_lives_under_auth() {
        let cli =
            Cli::try_parse_from(["redwind", "auth", "hash-password", "--password", "pw"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Auth {
                action: auth_commands::AuthAction::HashPassword { password: Some(ref p) }
            }) if p == "pw"
        ));
        assert!(Cli::try_parse_from(["redwind", "hash-password"]).is_err());
    }
}
