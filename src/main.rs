use anyhow::{anyhow, Result};
use porkbun_webhook::{Config, Provider, SharedConfig, TracingSink};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("porkbun-webhook".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let provider = Arc::new(Provider::from_config(&config, Arc::new(TracingSink))?);
    tracing::info!(
        "starting external-dns Porkbun webhook {} (dry run: {})",
        env!("CARGO_PKG_VERSION"),
        config.dry_run
    );

    tracing::info!("webhook listening on {}", &config.listen_addr);
    let api_server = porkbun_webhook::new_http(config.clone(), provider);
    let api_handle = tokio::spawn(api_server);

    tracing::info!("metrics listening on {}", &config.metrics_listen_addr);
    let metrics_server = porkbun_webhook::metrics::new(&config);
    let metrics_handle = tokio::spawn(metrics_server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
        Ok(metrics_res) = metrics_handle => {
            if let Err(err) = metrics_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

/// `RUST_LOG` wins when set. Otherwise `LOG_LEVEL` picks the level of the webhook's own logs,
/// accepting the logrus names external-dns deployments already use.
fn tracing_init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_default();
        let level = match level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" | "warning" => "warn",
            "error" | "fatal" | "panic" => "error",
            _ => "info",
        };
        format!("porkbun_webhook={level},tower_http={level}").into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    let fmt_layer = tracing_subscriber::fmt::layer();
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => registry.with(fmt_layer.json()).init(),
        _ => registry.with(fmt_layer).init(),
    }
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            let config = Config::try_from_file(&config_file)?;
            Ok(Arc::new(config))
        }
    }
}
