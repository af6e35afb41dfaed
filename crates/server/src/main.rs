mod api;
mod cli;
mod db;
mod router;
mod service;
mod state;
mod store;
mod tenant;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use estate_core::Config;

use crate::cli::{Cli, Command};
use crate::state::AppState;
use crate::store::PgEstateStore;

fn load_config() -> Config {
    estate_core::config::load_dotenv();
    Config::from_env()
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::init_pg_pool(&config.postgres).await?;
    let store = PgEstateStore::new(pool, &config.engine.tenant_table)?;

    let addr = config.server.bind_addr();
    let port = config.server.port;
    let state = Arc::new(AppState::new(config, Arc::new(store)));
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", port);
    info!("API docs at http://localhost:{}/docs", port);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = load_config();
    config.log_summary();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::Report { tenant, as_of, fixture } => cli::run_report(&config, tenant, as_of, fixture).await?,
    }

    Ok(())
}
