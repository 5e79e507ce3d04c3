//! Progress reporting abstractions for the teardown pipeline
//!
//! The pipeline never writes to process-wide output. It emits
//! [`TeardownEvent`]s into a [`ProgressSink`] supplied by the caller, which
//! may log them, forward them, or drop them.

use super::events::TeardownEvent;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Destination for teardown progress events
///
/// Sinks are shared by every concurrent server worker, so `emit` must be
/// safe to call from many tasks at once and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink: Send + Sync {
    /// Report one progress event
    fn emit(&self, event: TeardownEvent);
}

/// Progress sink that renders events as tracing events
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for LogSink {
    fn emit(&self, event: TeardownEvent) {
        match event {
            TeardownEvent::Started { network_domain_id } => {
                info!(network_domain_id = %network_domain_id, "Destroying network domain...");
            }
            TeardownEvent::StageStarted { stage, count } => {
                info!(stage = %stage, count, "Starting stage");
            }
            TeardownEvent::Deleting {
                kind,
                id,
                description,
            } => {
                info!(kind = %kind, id = %id, detail = %description, "Deleting...");
            }
            TeardownEvent::Deleted {
                kind,
                id,
                description,
            } => {
                info!(kind = %kind, id = %id, detail = %description, "Deleted");
            }
            TeardownEvent::WouldDelete {
                kind,
                id,
                description,
            } => {
                info!(kind = %kind, id = %id, detail = %description, "[DRY RUN] Would delete");
            }
            TeardownEvent::Stopping { server_id } => {
                info!(server_id = %server_id, "Stopping server...");
            }
            TeardownEvent::Stopped { server_id } => {
                info!(server_id = %server_id, "Stopped server");
            }
            TeardownEvent::ServerFailed {
                server_id,
                server_name,
                reason,
            } => {
                warn!(
                    server_id = %server_id,
                    server_name = %server_name,
                    reason = %reason,
                    "Server teardown failed"
                );
            }
            TeardownEvent::StageCompleted { stage, deleted } => {
                info!(stage = %stage, deleted, "Stage complete");
            }
            TeardownEvent::Completed { network_domain_id } => {
                info!(network_domain_id = %network_domain_id, "Network domain destroyed");
            }
        }
    }
}

/// Progress sink that forwards events to a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TeardownEvent>,
}

impl ChannelSink {
    /// Create a new channel sink
    pub fn new(tx: mpsc::UnboundedSender<TeardownEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TeardownEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: TeardownEvent) {
        // Receiver may be gone; progress is best-effort
        let _ = self.tx.send(event);
    }
}

/// Progress sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: TeardownEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teardown::stage::Stage;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.emit(TeardownEvent::StageStarted {
            stage: Stage::NatRules,
            count: 2,
        });
        sink.emit(TeardownEvent::StageCompleted {
            stage: Stage::NatRules,
            deleted: 2,
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            TeardownEvent::StageStarted {
                stage: Stage::NatRules,
                count: 2
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            TeardownEvent::StageCompleted { deleted: 2, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.emit(TeardownEvent::Stopped {
            server_id: "srv-1".into(),
        });
    }

    #[test]
    fn test_log_and_null_sinks_accept_every_event() {
        let events = vec![
            TeardownEvent::Started {
                network_domain_id: "nd-1".into(),
            },
            TeardownEvent::ServerFailed {
                server_id: "srv-1".into(),
                server_name: "web".into(),
                reason: "boom".into(),
            },
            TeardownEvent::Completed {
                network_domain_id: "nd-1".into(),
            },
        ];
        for event in events {
            LogSink::new().emit(event.clone());
            NullSink.emit(event);
        }
    }
}
