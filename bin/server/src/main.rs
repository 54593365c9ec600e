use autoreply_server::config::AppConfig;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins; LOG_LEVEL keeps working for existing deployments
    let default_filter = format!("{},tower_http=debug", config.log_level.to_lowercase());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&default_filter))
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(report) = autoreply_server::serve(config).await {
        tracing::error!(error = %report, "Server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
