//! Jira/Confluence MCP server speaking newline-delimited JSON-RPC on stdio.

use atlassian_mcp_bridge::config::AtlassianConfig;
use atlassian_mcp_bridge::infrastructure::atlassian::InMemoryAtlassian;
use atlassian_mcp_bridge::infrastructure::mcp_server::{AtlassianService, serve_stdio};
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "atlassian-server",
    version,
    about = "MCP server exposing Jira issues and Confluence pages as tools"
)]
struct ServerCli {
    /// Serve from an empty in-memory store instead of Atlassian Cloud
    #[arg(long)]
    offline: bool,
    /// How many levels of child issues to fetch below the requested one
    #[arg(long)]
    max_depth: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // stdout is the protocol channel
    atlassian_mcp_bridge::init_tracing();
    let cli = ServerCli::parse();

    let mut service = if cli.offline {
        info!("Starting with in-memory Atlassian store");
        AtlassianService::in_memory(Arc::new(InMemoryAtlassian::default()))
    } else {
        let credentials = AtlassianConfig::from_env()?;
        info!(?credentials, "Starting against Atlassian Cloud");
        AtlassianService::from_config(&credentials)
    };
    if let Some(depth) = cli.max_depth {
        service = service.with_max_depth(depth);
    }

    serve_stdio(service).await?;
    info!("MCP server stopped");
    Ok(())
}
