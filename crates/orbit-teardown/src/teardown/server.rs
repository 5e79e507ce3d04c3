//! Server teardown worker
//!
//! Drives one server from whatever power state it was listed in to deleted:
//!
//! ```text
//! Running -> Stopping -> Stopped -> Deleting -> AwaitingRemoval -> Done
//! ```
//!
//! A server listed as stopped starts at `Stopped`. Any error moves the
//! worker to its absorbing failed state by returning it; siblings running
//! concurrently are unaffected.

use super::error::TeardownError;
use super::events::TeardownEvent;
use super::progress::ProgressSink;
use super::waiter::{Transition, await_terminal};
use crate::api::CloudControlApi;
use crate::wait::WaitConfig;
use orbit_common::{ResourceKind, Server};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Position of a server in its teardown path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Powered on; a power-off must be issued
    Running,
    /// Power-off issued; waiting for it to settle
    Stopping,
    /// Powered off; ready for deletion
    Stopped,
    /// Delete must be issued
    Deleting,
    /// Delete issued; waiting for the server to disappear
    AwaitingRemoval,
    /// Server is gone
    Done,
}

impl ServerState {
    /// Where a server enters the state machine
    pub fn initial(server: &Server) -> Self {
        if server.started {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }
}

/// Everything one worker needs; cheap to clone per server
pub struct ServerWorker<C> {
    api: Arc<C>,
    sink: Arc<dyn ProgressSink>,
    wait: WaitConfig,
    /// Held only while a delete request is being issued
    delete_lock: Arc<Mutex<()>>,
}

impl<C> Clone for ServerWorker<C> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            sink: Arc::clone(&self.sink),
            wait: self.wait.clone(),
            delete_lock: Arc::clone(&self.delete_lock),
        }
    }
}

impl<C: CloudControlApi> ServerWorker<C> {
    /// Create a worker with its own delete lock
    pub fn new(api: Arc<C>, sink: Arc<dyn ProgressSink>, wait: WaitConfig) -> Self {
        Self {
            api,
            sink,
            wait,
            delete_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Tear down one server, returning once it is deleted or has failed.
    pub async fn run(&self, server: &Server) -> Result<(), TeardownError> {
        let mut state = ServerState::initial(server);

        while state != ServerState::Done {
            let next = self.step(server, state).await?;
            debug!(server_id = %server.id, from = ?state, to = ?next, "Server transition");
            state = next;
        }

        self.sink.emit(TeardownEvent::Deleted {
            kind: ResourceKind::Server,
            id: server.id.clone(),
            description: server.name.clone(),
        });
        Ok(())
    }

    async fn step(&self, server: &Server, state: ServerState) -> Result<ServerState, TeardownError> {
        let id = server.id.as_str();

        match state {
            ServerState::Running => {
                self.sink.emit(TeardownEvent::Stopping {
                    server_id: id.to_string(),
                });
                self.api
                    .power_off_server(id)
                    .await
                    .map_err(|source| TeardownError::PowerOffRejected {
                        id: id.to_string(),
                        source,
                    })?;
                Ok(ServerState::Stopping)
            }
            ServerState::Stopping => {
                await_terminal(
                    self.api.as_ref(),
                    ResourceKind::Server,
                    id,
                    Transition::PoweredOff,
                    &self.wait,
                )
                .await?;
                self.sink.emit(TeardownEvent::Stopped {
                    server_id: id.to_string(),
                });
                Ok(ServerState::Stopped)
            }
            ServerState::Stopped => Ok(ServerState::Deleting),
            ServerState::Deleting => {
                let _guard = self.delete_lock.lock().await;
                self.sink.emit(TeardownEvent::Deleting {
                    kind: ResourceKind::Server,
                    id: id.to_string(),
                    description: server.name.clone(),
                });
                self.api
                    .delete_server(id)
                    .await
                    .map_err(|source| TeardownError::DeletionRejected {
                        kind: ResourceKind::Server,
                        id: id.to_string(),
                        source,
                    })?;
                Ok(ServerState::AwaitingRemoval)
            }
            ServerState::AwaitingRemoval => {
                await_terminal(
                    self.api.as_ref(),
                    ResourceKind::Server,
                    id,
                    Transition::Deleted,
                    &self.wait,
                )
                .await?;
                Ok(ServerState::Done)
            }
            ServerState::Done => Ok(ServerState::Done),
        }
    }
}
