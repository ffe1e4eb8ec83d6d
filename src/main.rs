use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use compliancevault::core::config::AppConfig;
use compliancevault::core::shared::state::AppState;
use compliancevault::main_module::{init_store, parse_cli_args, run_axum_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mode = parse_cli_args(&args);

    info!("Starting ComplianceVault {}", env!("CARGO_PKG_VERSION"));
    let config = AppConfig::from_env()?;

    let store = tokio::task::spawn_blocking({
        let config = config.clone();
        move || init_store(&config, mode)
    })
    .await??;

    let app_state = Arc::new(AppState::new(config, store));
    run_axum_server(app_state).await?;

    info!("ComplianceVault stopped");
    Ok(())
}
