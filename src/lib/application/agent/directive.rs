use crate::domain::InvocationRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentDirective {
    Final { response: String },
    /// One or more tool calls to run in the same round.
    Invoke(Vec<InvocationRequest>),
}
