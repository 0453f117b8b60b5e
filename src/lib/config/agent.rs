use super::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MAX_TURNS: usize = 8;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 20;

/// `[agent]` table: limits for one bridge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_turns: usize,
    pub tool_timeout: Duration,
    pub startup_timeout: Duration,
    pub parallel_dispatch: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            parallel_dispatch: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAgentSettings {
    max_turns: Option<usize>,
    tool_timeout_secs: Option<u64>,
    startup_timeout_secs: Option<u64>,
    parallel_dispatch: Option<bool>,
}

impl TryFrom<RawAgentSettings> for AgentSettings {
    type Error = ConfigError;

    fn try_from(raw: RawAgentSettings) -> Result<Self, Self::Error> {
        let defaults = AgentSettings::default();
        let positive = |field: &'static str, value: Option<u64>, default: Duration| match value {
            Some(0) => Err(ConfigError::InvalidAgentSetting {
                field,
                reason: "must be greater than zero".into(),
            }),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(default),
        };

        Ok(Self {
            max_turns: raw.max_turns.unwrap_or(defaults.max_turns),
            tool_timeout: positive("tool_timeout_secs", raw.tool_timeout_secs, defaults.tool_timeout)?,
            startup_timeout: positive(
                "startup_timeout_secs",
                raw.startup_timeout_secs,
                defaults.startup_timeout,
            )?,
            parallel_dispatch: raw.parallel_dispatch.unwrap_or(defaults.parallel_dispatch),
        })
    }
}
