use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// How to launch the MCP server process.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    #[serde(default)]
    name: Option<String>,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

const DEFAULT_SERVER_NAME: &str = "atlassian";

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        Self {
            name: raw
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            command: PathBuf::from(expand(&raw.command)),
            args: raw.args.iter().map(|arg| expand(arg)).collect(),
            env: raw
                .env
                .into_iter()
                .map(|(key, value)| {
                    let value = expand(&value);
                    (key, value)
                })
                .collect(),
            workdir: raw.workdir.map(|dir| PathBuf::from(expand(&dir))),
        }
    }
}
