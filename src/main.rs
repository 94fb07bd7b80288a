use anyhow::Result;
use resc::{cli::config_path_from_args, config::Config, logging::init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::resolve(config_path.as_deref())?;
    let logging_guard = init_tracing(&config.logging)?;

    tracing::info!(
        target: "resc",
        run_id = %logging_guard.run_id(),
        config = ?config_path,
        max_operators = config.engine.max_operators,
        max_in_flight = config.worker.max_in_flight,
        request_timeout_ms = config.worker.request_timeout_ms,
        "resc_starting"
    );

    server::run(config).await
}
