use std::{path::Path, sync::Arc};

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use botwatch::collaborators::Collaborators;
use botwatch::config::{ConfigError, MonitoringConfig, load_config};
use botwatch::faults::{install_panic_hook, shutdown_signal, spawn_supervised};
use botwatch::http::build_router;
use botwatch::service::MonitoringService;

const CONFIG_PATH: &str = "monitoring.toml";

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

fn read_config() -> Result<MonitoringConfig, ConfigError> {
    if Path::new(CONFIG_PATH).exists() {
        load_config(CONFIG_PATH)
    } else {
        log::info!("config_file_missing path={} source=env_and_defaults", CONFIG_PATH);
        MonitoringConfig::from_env()
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = read_config()?;
    let bind_addr = config.server.bind_addr.clone();

    let service = Arc::new(MonitoringService::new(config, Collaborators::new())?);
    install_panic_hook(service.alerts().clone());
    service.start().await;

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("http_listening addr={}", bind_addr);
    let router = build_router(service.clone());
    spawn_supervised(service.alerts().clone(), "http_server", async move {
        axum::serve(listener, router).await
    });

    shutdown_signal().await;
    service.shutdown().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_json_logging();
    log::info!("Monitoring service is starting...");

    match run().await {
        Ok(()) => {
            log::info!("Monitoring service stopped");
            std::process::exit(0);
        }
        Err(error) => {
            log::error!("Monitoring service failed: {}", error);
            std::process::exit(1);
        }
    }
}
