mod catalog;
mod collector;
mod command;
mod config;
mod error;
mod profiles;
mod response;
mod runner;
mod sanitize;
mod scan_types;
mod scanner;
mod server;
#[cfg(all(test, unix))]
mod test_support;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("🚀 nuclei-relay starting...");

    let config = Config::from_env()?;

    // Start the server
    server::run(config).await
}
