use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "atlassian-bridge",
    version,
    about = "Answer a Jira/Confluence request with a tool-calling model"
)]
pub struct Cli {
    /// Path to bridge.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured system prompt
    #[arg(long)]
    pub system: Option<String>,
    /// Override the model provider id
    #[arg(long)]
    pub provider: Option<String>,
    /// Override the model name
    #[arg(long)]
    pub model: Option<String>,
    /// Launch this MCP server instead of the configured one
    #[arg(long)]
    pub server_command: Option<PathBuf>,
    /// Argument for `--server-command` (repeatable)
    #[arg(long = "server-arg", requires = "server_command", allow_hyphen_values = true)]
    pub server_args: Vec<String>,
    /// Serve tools in-process from an empty in-memory Atlassian store
    #[arg(long, conflicts_with = "server_command")]
    pub offline: bool,
    /// Maximum tool rounds before the run is abandoned
    #[arg(long)]
    pub max_turns: Option<usize>,
    /// Dispatch tool calls of one round one after another
    #[arg(long)]
    pub sequential: bool,
    /// Read the request from a file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    /// The request; read from stdin when omitted
    pub prompt: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_override_and_prompt_words() {
        let cli = Cli::parse_from([
            "atlassian-bridge",
            "--server-command",
            "./atlassian-server",
            "--server-arg",
            "--offline",
            "--max-turns",
            "3",
            "summarise",
            "PROJ-1",
        ]);
        assert_eq!(cli.server_command, Some(PathBuf::from("./atlassian-server")));
        assert_eq!(cli.server_args, vec!["--offline".to_string()]);
        assert_eq!(cli.max_turns, Some(3));
        assert_eq!(cli.prompt.join(" "), "summarise PROJ-1");
    }

    #[test]
    fn offline_conflicts_with_server_command() {
        let parsed = Cli::try_parse_from([
            "atlassian-bridge",
            "--offline",
            "--server-command",
            "srv",
            "hi",
        ]);
        assert!(parsed.is_err());
    }
}
