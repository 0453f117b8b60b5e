//! Agent-facing entry point: open a session, run the agent, always close.

use crate::application::agent::{Agent, AgentError, AgentOptions, AgentOutcome};
use crate::application::session::{BackendLocator, Session, SessionManager};
use crate::application::tooling::ToolServerInterface;
use crate::model::ModelProvider;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Bridge<P: ModelProvider> {
    sessions: SessionManager,
    agent: Agent<P>,
}

impl<P: ModelProvider> Bridge<P> {
    pub fn new(provider: Arc<P>, options: AgentOptions, sessions: SessionManager) -> Self {
        Self {
            sessions,
            agent: Agent::new(provider, options),
        }
    }

    pub async fn run(
        &self,
        request: &str,
        locator: &BackendLocator,
    ) -> Result<AgentOutcome, AgentError> {
        self.run_with_cancel(request, locator, &CancellationToken::new())
            .await
    }

    pub async fn run_with_cancel(
        &self,
        request: &str,
        locator: &BackendLocator,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        let session = self.sessions.open(locator).await?;
        self.drive(session, request, cancel).await
    }

    /// Run against an existing, not yet connected, connection handle.
    pub async fn run_on(
        &self,
        connection: Arc<dyn ToolServerInterface>,
        request: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        let session = self.sessions.attach(connection).await?;
        self.drive(session, request, cancel).await
    }

    async fn drive(
        &self,
        mut session: Session,
        request: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        let outcome = self.agent.run(&mut session, request, cancel).await;
        info!(
            session = session.id(),
            success = outcome.is_ok(),
            "Bridge run finished"
        );
        session.close().await;
        outcome
    }
}
