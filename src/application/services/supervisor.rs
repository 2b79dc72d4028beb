//! Connection supervisor - owns the session lifecycle
//!
//! Pumps connection events, hands every message to the dispatcher on its own
//! task, and reconnects on recoverable disconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::application::errors::BotError;
use crate::application::messaging::CommandDispatcher;
use crate::domain::traits::{Connection, ConnectionEvent, DisconnectReason};

/// How the supervisor retries after a recoverable disconnect
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    /// Consecutive attempts before giving up; reset once a session opens
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

/// Connection supervisor
pub struct ConnectionSupervisor {
    connection: Arc<dyn Connection>,
    dispatcher: Arc<CommandDispatcher>,
    policy: ReconnectPolicy,
}

impl ConnectionSupervisor {
    pub fn new(connection: Arc<dyn Connection>, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            connection,
            dispatcher,
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until the event stream ends (`Ok`) or the session cannot be resumed (`Err`)
    ///
    /// In-flight dispatches are awaited before returning.
    pub async fn run(&self) -> Result<(), BotError> {
        self.connection.connect().await?;
        info!("Connection established");

        let mut tasks = JoinSet::new();
        let result = self.pump(&mut tasks).await;

        if !tasks.is_empty() {
            debug!("Waiting for {} in-flight commands", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Dispatch task failed: {}", e);
            }
        }

        result
    }

    async fn pump(&self, tasks: &mut JoinSet<()>) -> Result<(), BotError> {
        let mut attempts = 0u32;

        while let Some(event) = self.connection.next_event().await {
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    error!("Dispatch task failed: {}", e);
                }
            }

            match event {
                ConnectionEvent::Open => {
                    info!("Session open");
                    attempts = 0;
                }
                ConnectionEvent::Message(message) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tasks.spawn(async move {
                        let outcome = dispatcher.dispatch(message).await;
                        debug!("Dispatch outcome: {:?}", outcome);
                    });
                }
                ConnectionEvent::Participants {
                    group,
                    participants,
                    action,
                } => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tasks.spawn(async move {
                        dispatcher.participants_changed(&group, &participants, action).await;
                    });
                }
                ConnectionEvent::Closed(reason) => {
                    self.handle_disconnect(reason, &mut attempts).await?;
                }
            }
        }

        info!("Event stream ended, shutting down");
        Ok(())
    }

    async fn handle_disconnect(&self, reason: DisconnectReason, attempts: &mut u32) -> Result<(), BotError> {
        if !reason.is_recoverable() {
            if reason.invalidates_session() {
                error!("Session invalidated ({:?}), credentials must be renewed", reason);
            } else {
                error!("Connection closed ({:?}), not reconnecting", reason);
            }
            return Err(BotError::SessionEnded(format!("{:?}", reason)));
        }

        warn!("Connection closed ({:?}), reconnecting", reason);
        let mut immediate = reason.is_restart();

        loop {
            *attempts += 1;
            if *attempts > self.policy.max_attempts {
                return Err(BotError::Connection(format!(
                    "Giving up after {} reconnect attempts",
                    self.policy.max_attempts
                )));
            }

            if !immediate {
                tokio::time::sleep(self.policy.interval).await;
            }
            immediate = false;

            info!("Reconnect attempt {}/{}", attempts, self.policy.max_attempts);
            match self.connection.connect().await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Reconnect failed: {}", e),
            }
        }
    }
}
