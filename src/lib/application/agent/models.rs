use crate::domain::{InvocationRequest, InvocationResult};
use serde::Serialize;

pub const DEFAULT_MAX_TURNS: usize = 8;

/// One executed invocation, kept for the run's audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub round: usize,
    pub request: InvocationRequest,
    pub result: InvocationResult,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub session_id: String,
    pub response: String,
    pub steps: Vec<AgentStep>,
    pub logs: Vec<String>,
    pub rounds: usize,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    /// Tool rounds allowed before the run fails.
    pub max_turns: usize,
    pub parallel_dispatch: bool,
}

impl AgentOptions {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
            parallel_dispatch: true,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_parallel_dispatch(mut self, parallel: bool) -> Self {
        self.parallel_dispatch = parallel;
        self
    }
}
