use envconfig::Envconfig;
use eyre::Result;
use tokio::signal;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use hook_inspector::config::Config;
use hook_inspector::metrics::setup_metrics_recorder;
use hook_inspector::router::router;
use hook_inspector::server::serve;
use hook_inspector::state::AppState;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    let config = Config::init_from_env()?;
    let state = AppState::from_config(&config).await?;

    let recorder = if config.export_prometheus {
        Some(setup_metrics_recorder()?)
    } else {
        None
    };

    let app = router(state, &config, recorder);
    let listener = tokio::net::TcpListener::bind(config.bind()).await?;
    serve(app, listener, shutdown()).await?;

    Ok(())
}
