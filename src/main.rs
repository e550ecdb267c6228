use anyhow::Result;
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_disaster_map::config::Config;
use mcp_disaster_map::poller::spawn_pollers;
use mcp_disaster_map::service::DisasterMap;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_disaster_map=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting MCP disaster map server");

    let config = Config::load()?;
    let disaster_map = DisasterMap::new(&config)?;
    let pollers = spawn_pollers(&disaster_map, &config)?;

    let server = disaster_map.serve(rmcp::transport::stdio()).await?;
    server.waiting().await?;

    for poller in pollers {
        poller.abort();
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}
