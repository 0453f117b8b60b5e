//! Session manager
//!
//! A session is one live backend connection plus the registry discovered on
//! it. It lives for a single user request and is closed on every exit path.

use crate::application::agent::AgentError;
use crate::application::executor::BackendExecutor;
use crate::application::registry::CapabilityRegistry;
use crate::application::tooling::{LocalServer, McpProcess, ToolInvokeError, ToolServerInterface};
use crate::config::ServerConfig;
use crate::infrastructure::mcp_server::AtlassianService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the backend lives.
#[derive(Clone)]
pub enum BackendLocator {
    /// Spawn this command and speak MCP over its stdio.
    Process(ServerConfig),
    /// Serve the tools from this process.
    InProcess(AtlassianService),
}

impl BackendLocator {
    fn connect_handle(&self) -> Arc<dyn ToolServerInterface> {
        match self {
            BackendLocator::Process(config) => Arc::new(McpProcess::new(config.clone())),
            BackendLocator::InProcess(service) => Arc::new(LocalServer::new(service.clone())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    startup_timeout: Duration,
    call_timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_STARTUP_TIMEOUT, DEFAULT_CALL_TIMEOUT)
    }
}

impl SessionManager {
    pub fn new(startup_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            startup_timeout,
            call_timeout,
        }
    }

    pub async fn open(&self, locator: &BackendLocator) -> Result<Session, AgentError> {
        self.attach(locator.connect_handle()).await
    }

    /// Handshake and discover on an already constructed connection.
    pub async fn attach(
        &self,
        connection: Arc<dyn ToolServerInterface>,
    ) -> Result<Session, AgentError> {
        let server = connection.name().to_string();
        info!(server = %server, "Opening backend session");

        match tokio::time::timeout(self.startup_timeout, connection.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(server = %server, %err, "Backend handshake failed");
                connection.close().await;
                return Err(AgentError::Connection(err));
            }
            Err(_) => {
                warn!(server = %server, "Backend handshake timed out");
                connection.close().await;
                return Err(AgentError::Connection(ToolInvokeError::StartupTimeout {
                    server,
                    seconds: self.startup_timeout.as_secs(),
                }));
            }
        }

        let registry = match CapabilityRegistry::discover(connection.as_ref()).await {
            Ok(registry) => Arc::new(registry),
            Err(err) => {
                warn!(server = %server, %err, "Backend discovery failed");
                connection.close().await;
                return Err(AgentError::Discovery(err));
            }
        };

        let executor = BackendExecutor::new(connection.clone(), registry.clone(), self.call_timeout);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            connection,
            registry,
            executor,
            turns: 0,
        };
        info!(
            session = %session.id,
            server = %server,
            operations = session.registry.len(),
            "Backend session ready"
        );
        Ok(session)
    }
}

pub struct Session {
    id: String,
    connection: Arc<dyn ToolServerInterface>,
    registry: Arc<CapabilityRegistry>,
    executor: BackendExecutor,
    turns: usize,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn server_name(&self) -> &str {
        self.connection.name()
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &BackendExecutor {
        &self.executor
    }

    /// Tool rounds dispatched so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    pub(crate) fn record_turn(&mut self) -> usize {
        self.turns += 1;
        self.turns
    }

    pub fn is_alive(&self) -> bool {
        self.connection.is_connected() && !self.executor.connection_lost()
    }

    pub async fn close(self) {
        info!(session = %self.id, turns = self.turns, "Closing backend session");
        self.connection.close().await;
    }
}
