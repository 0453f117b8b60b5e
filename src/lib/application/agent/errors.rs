use crate::application::registry::DiscoveryError;
use crate::application::tooling::ToolInvokeError;
use crate::model::ModelError;
use thiserror::Error;

/// Failures that end a bridge run. Per-invocation failures never appear here;
/// they are handed back to the agent as error results instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("backend discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("could not connect to the backend: {0}")]
    Connection(#[source] ToolInvokeError),
    #[error("agent requested more than {limit} tool rounds")]
    TurnLimitExceeded { limit: usize },
    #[error("backend connection lost: {0}")]
    ConnectionLost(String),
    #[error("agent run cancelled")]
    Cancelled,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Discovery(err) => {
                format!("The Atlassian server started but its tool list could not be read ({err}).")
            }
            AgentError::Connection(err) => {
                format!("Could not start or reach the Atlassian server: {err}.")
            }
            AgentError::TurnLimitExceeded { limit } => format!(
                "The assistant needed more than {limit} tool rounds and was stopped. Try a narrower request."
            ),
            AgentError::ConnectionLost(detail) => {
                format!("The connection to the Atlassian server was lost ({detail}).")
            }
            AgentError::Cancelled => "The request was cancelled.".to_string(),
            AgentError::Model(err) => err.user_message(),
            AgentError::InvalidResponse(_) => {
                "The assistant replied with something that could not be understood. Please try again."
                    .to_string()
            }
        }
    }
}
