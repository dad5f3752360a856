mod controller;
mod dispatch;
mod http;
mod page;

use rad10_proto::config::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rad10_web=debug"))
}

/// stderr by default; `[logging] to_file` appends to the data dir instead.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    if config.logging.to_file {
        let log_path = Config::log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(log_file)
                    .with_ansi(false),
            )
            .with(env_filter())
            .init();
        info!("Log file: {:?}", log_path);
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(env_filter())
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional first argument: an explicit config file
    let (config, config_path) = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => (Config::load_from(&path)?, path),
        None => (Config::load()?, Config::config_path()),
    };

    init_logging(&config)?;
    info!("Config loaded from: {:?}", config_path);

    let controller = controller::from_config(&config.controller);
    info!(
        "Controller backend: {} ({} presets, volume step {})",
        controller.name(),
        config.presets.len(),
        config.controller.volume_step
    );

    let state = http::HttpState {
        controller,
        presets: config.presets.clone().into(),
        volume_step: config.controller.volume_step,
    };

    http::serve(
        &config.http.bind_address,
        config.http.port,
        state,
        config.http.static_dir.clone(),
    )
    .await
}
