pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, bridge, executor, formatter, registry, session, tooling};
pub use cli::Cli;
pub use config::{AppConfig, ModelProviderConfig};
pub use domain::types;
pub use infrastructure::{atlassian, mcp_server, model, rpc};

use agent::{AgentOptions, AgentOutcome};
use bridge::Bridge;
use config::{AtlassianConfig, ConfigError, ServerConfig};
use infrastructure::atlassian::InMemoryAtlassian;
use infrastructure::mcp_server::AtlassianService;
use infrastructure::model::DynamicModelProvider;
use serde_json::json;
use session::{BackendLocator, SessionManager};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Run one request end to end and print the outcome as JSON on stdout.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting atlassian-bridge");
    debug!(config = ?cli.config, offline = cli.offline, "CLI arguments parsed");

    let mut app = AppConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&cli, &mut app)?;

    let prompt = load_prompt(&cli)?;
    let locator = resolve_locator(&cli, &app)?;
    let provider = Arc::new(DynamicModelProvider::from_configs(
        &app.providers,
        &app.default_provider,
        &app.model,
    )?);

    let options = AgentOptions::new(app.default_provider.clone(), app.model.clone())
        .with_system_prompt(app.system_prompt.clone())
        .with_max_turns(app.agent.max_turns)
        .with_parallel_dispatch(app.agent.parallel_dispatch);
    let sessions = SessionManager::new(app.agent.startup_timeout, app.agent.tool_timeout);
    let bridge = Bridge::new(provider, options, sessions);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let result = bridge.run_with_cancel(&prompt, &locator, &cancel).await;
    watcher.abort();

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&render_outcome(&outcome))?);
            info!("Bridge execution finished");
            Ok(())
        }
        Err(err) => {
            warn!(%err, "Bridge run failed");
            eprintln!("{}", err.user_message());
            Err(err.into())
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Interrupt received, cancelling run");
        cancel.cancel();
    }
}

fn render_outcome(outcome: &AgentOutcome) -> serde_json::Value {
    json!({
        "session_id": outcome.session_id,
        "response": outcome.response,
        "rounds": outcome.rounds,
        "tool_steps": outcome.steps,
    })
}

/// Logs go to stderr so stdout carries only the answer.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn apply_cli_overrides(cli: &Cli, app: &mut AppConfig) -> Result<(), ConfigError> {
    if let Some(provider) = &cli.provider {
        info!(provider = provider.as_str(), "Overriding provider from CLI flag");
        app.default_provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        info!(model = model.as_str(), "Overriding model from CLI flag");
        app.model = model.clone();
    }
    let default_provider = app
        .providers
        .iter_mut()
        .find(|provider| provider.id == app.default_provider)
        .ok_or_else(|| ConfigError::ProviderNotFound {
            provider: app.default_provider.clone(),
        })?;
    default_provider.ensure_model(&app.model);

    if let Some(system) = &cli.system {
        app.system_prompt = Some(system.clone());
    }
    if let Some(max_turns) = cli.max_turns {
        app.agent.max_turns = max_turns;
    }
    if cli.sequential {
        app.agent.parallel_dispatch = false;
    }
    Ok(())
}

fn resolve_locator(cli: &Cli, app: &AppConfig) -> Result<BackendLocator, ConfigError> {
    if let Some(command) = &cli.server_command {
        let server = ServerConfig::new(constants::CLI_SERVER_NAME, command.clone())
            .with_args(cli.server_args.clone());
        info!(command = %server.command.display(), "Using MCP server from CLI flag");
        return Ok(BackendLocator::Process(server));
    }
    if cli.offline {
        info!("Serving tools in-process from an in-memory store");
        let store = Arc::new(InMemoryAtlassian::default());
        return Ok(BackendLocator::InProcess(AtlassianService::in_memory(store)));
    }
    if let Some(server) = &app.server {
        info!(server = server.name.as_str(), "Using configured MCP server");
        return Ok(BackendLocator::Process(server.clone()));
    }

    let credentials = AtlassianConfig::from_env()?;
    info!(
        jira = credentials.jira_base_url.as_str(),
        confluence = credentials.confluence_base_url.as_str(),
        "Serving tools in-process against Atlassian Cloud"
    );
    Ok(BackendLocator::InProcess(AtlassianService::from_config(
        &credentials,
    )))
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path.display(), "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return non_empty(content);
    }

    if !cli.prompt.is_empty() {
        debug!("Using prompt provided through CLI arguments");
        return non_empty(cli.prompt.join(" "));
    }

    if !io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return non_empty(buffer);
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn non_empty(prompt: String) -> Result<String, Box<dyn Error>> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("prompt is empty".into());
    }
    Ok(prompt.to_string())
}
