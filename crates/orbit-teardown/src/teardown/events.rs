//! Progress events emitted by the teardown pipeline
//!
//! These events are the interface between the pipeline and whatever is
//! presenting progress (a log, a CLI, a test). They carry no control flow:
//! success and failure are reported through the pipeline's return value.

use super::stage::Stage;
use orbit_common::ResourceKind;

/// Event emitted during a teardown run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownEvent {
    /// Teardown of a network domain began
    Started { network_domain_id: String },
    /// A stage finished listing and is about to act on `count` resources
    StageStarted { stage: Stage, count: usize },
    /// A delete request is about to be issued
    Deleting {
        kind: ResourceKind,
        id: String,
        description: String,
    },
    /// A resource is confirmed deleted
    Deleted {
        kind: ResourceKind,
        id: String,
        description: String,
    },
    /// Dry run: a resource would have been deleted
    WouldDelete {
        kind: ResourceKind,
        id: String,
        description: String,
    },
    /// A running server is being powered off
    Stopping { server_id: String },
    /// A server is confirmed powered off
    Stopped { server_id: String },
    /// One server's teardown path failed
    ServerFailed {
        server_id: String,
        server_name: String,
        reason: String,
    },
    /// A stage finished successfully
    StageCompleted { stage: Stage, deleted: usize },
    /// The whole network domain is gone
    Completed { network_domain_id: String },
}
