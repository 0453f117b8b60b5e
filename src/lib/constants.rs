//! Application constants
//!
//! Single source of truth for paths and other constants.

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Name given to a server launched with `--server-command`.
pub const CLI_SERVER_NAME: &str = "atlassian";
