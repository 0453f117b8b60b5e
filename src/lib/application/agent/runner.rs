use super::directive::AgentDirective;
use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use super::runtime::{JSON_RETRY_MESSAGE, ToolRuntime};
use crate::application::session::Session;
use crate::domain::{ChatMessage, InvocationRequest};
use crate::model::{ModelProvider, ModelRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum retry attempts for JSON parsing failures
const MAX_JSON_RETRIES: u8 = 3;

const PREVIEW_LIMIT: usize = 160;

enum TurnState {
    AwaitingAgent,
    DispatchingTools(Vec<InvocationRequest>),
    Done(String),
    Failed(AgentError),
}

pub struct Agent<P: ModelProvider> {
    provider: Arc<P>,
    options: AgentOptions,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(provider: Arc<P>, options: AgentOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Drive the conversation until the agent answers or the run fails.
    ///
    /// The session is borrowed mutably for its turn counter; closing it is
    /// the caller's job.
    pub async fn run(
        &self,
        session: &mut Session,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        info!(session = session.id(), "Agent run started");
        let runtime = ToolRuntime::from_registry(session.server_name(), session.registry());

        let instructions = runtime.compose_system_instructions();
        let system_prompt = match &self.options.system_prompt {
            Some(existing) => format!("{existing}\n\n{instructions}"),
            None => instructions,
        };
        let mut history = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(
                runtime.initial_user_prompt(prompt, session.registry().to_agent_schema()),
            ),
        ];

        let mut logs = vec![
            format!("Initial agent request: {}", summarise(prompt)),
            format!(
                "Active provider: '{}' | Model: '{}'",
                self.options.provider, self.options.model
            ),
        ];
        let mut steps = Vec::new();
        let mut state = TurnState::AwaitingAgent;

        loop {
            state = match state {
                TurnState::AwaitingAgent => {
                    if cancel.is_cancelled() {
                        TurnState::Failed(AgentError::Cancelled)
                    } else {
                        let round = session.turns() + 1;
                        match self
                            .next_directive(&runtime, &mut history, &mut logs, round, cancel)
                            .await
                        {
                            Ok(AgentDirective::Final { response }) => TurnState::Done(response),
                            Ok(AgentDirective::Invoke(_))
                                if session.turns() >= self.options.max_turns =>
                            {
                                warn!(
                                    session = session.id(),
                                    limit = self.options.max_turns,
                                    "Agent exceeded max tool rounds"
                                );
                                TurnState::Failed(AgentError::TurnLimitExceeded {
                                    limit: self.options.max_turns,
                                })
                            }
                            Ok(AgentDirective::Invoke(requests)) => {
                                TurnState::DispatchingTools(requests)
                            }
                            Err(err) => TurnState::Failed(err),
                        }
                    }
                }
                TurnState::DispatchingTools(requests) => {
                    if cancel.is_cancelled() {
                        TurnState::Failed(AgentError::Cancelled)
                    } else {
                        let round = session.record_turn();
                        info!(
                            session = session.id(),
                            round,
                            calls = requests.len(),
                            "Dispatching tool round"
                        );
                        let results = session
                            .executor()
                            .execute_all(&requests, self.options.parallel_dispatch)
                            .await;

                        for (request, result) in requests.into_iter().zip(results.iter()) {
                            logs.push(format!(
                                "Tool '{}' [{}] executed (success: {})",
                                request.operation_name,
                                request.invocation_id,
                                result.is_success()
                            ));
                            if !result.is_success() {
                                logs.push(format!("Tool message: {}", summarise(&result.payload)));
                            }
                            steps.push(AgentStep {
                                round,
                                request,
                                result: result.clone(),
                            });
                        }
                        history.push(ChatMessage::user(
                            runtime.tool_results_message(round, &results),
                        ));

                        if session.executor().connection_lost() {
                            TurnState::Failed(AgentError::ConnectionLost(format!(
                                "server '{}' stopped responding during round {round}",
                                session.server_name()
                            )))
                        } else {
                            TurnState::AwaitingAgent
                        }
                    }
                }
                TurnState::Done(response) => {
                    info!(
                        session = session.id(),
                        rounds = session.turns(),
                        "Agent returned final response"
                    );
                    logs.push(format!("Agent final answer: {}", summarise(&response)));
                    return Ok(AgentOutcome {
                        session_id: session.id().to_string(),
                        response,
                        steps,
                        logs,
                        rounds: session.turns(),
                    });
                }
                TurnState::Failed(err) => {
                    warn!(session = session.id(), error = %err, "Agent run failed");
                    return Err(err);
                }
            };
        }
    }

    /// Ask the model for its next action, requesting corrections for
    /// malformed replies.
    async fn next_directive(
        &self,
        runtime: &ToolRuntime,
        history: &mut Vec<ChatMessage>,
        logs: &mut Vec<String>,
        round: usize,
        cancel: &CancellationToken,
    ) -> Result<AgentDirective, AgentError> {
        let mut retry_count = 0u8;
        loop {
            let content = self.chat(history, cancel).await?;
            history.push(ChatMessage::assistant(content.clone()));

            match runtime.parse_agent_action(&content, round) {
                Ok(directive) => return Ok(directive),
                Err(err) if retry_count < MAX_JSON_RETRIES => {
                    retry_count += 1;
                    warn!(
                        attempt = retry_count,
                        max_attempts = MAX_JSON_RETRIES,
                        error = %err,
                        "JSON parse failed, requesting correction from model"
                    );
                    logs.push(format!(
                        "JSON parse retry attempt {retry_count}/{MAX_JSON_RETRIES}: {err}"
                    ));
                    history.push(ChatMessage::user(format!(
                        "{JSON_RETRY_MESSAGE}\n\nError details: {err}"
                    )));
                }
                Err(err) => {
                    warn!(attempts = retry_count, "JSON parse failed after max retries");
                    return Err(AgentError::InvalidResponse(format!(
                        "Invalid JSON after {MAX_JSON_RETRIES} retry attempts: {err}"
                    )));
                }
            }
        }
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let request = ModelRequest {
            provider: self.options.provider.clone(),
            model: self.options.model.clone(),
            messages: history.to_vec(),
        };
        debug!(messages = history.len(), "Submitting agent turn to model provider");

        tokio::select! {
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            response = self.provider.chat(request) => Ok(response?.message.content),
        }
    }
}

fn summarise(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_LIMIT {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_LIMIT).collect();
        format!("{cut}...")
    }
}
