pub mod agent;
pub mod app;
pub mod atlassian;
pub mod error;
pub mod loader;
pub mod provider;
pub mod server;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/bridge.toml";

pub use agent::AgentSettings;
pub use app::AppConfig;
pub use atlassian::AtlassianConfig;
pub use error::ConfigError;
pub use provider::{ModelInfo, ModelProviderConfig};
pub use server::ServerConfig;
