//! Teardown error taxonomy
//!
//! Every failure propagates upward unhandled; nothing here is retried.
//! The pipeline adds exactly one layer, [`TeardownError::Stage`], naming the
//! stage that failed.

use super::stage::Stage;
use super::waiter::Transition;
use crate::api::ApiError;
use orbit_common::ResourceKind;
use std::time::Duration;
use thiserror::Error;

/// Failure of one server's teardown path, as collected by the server stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
    pub server_id: String,
    pub server_name: String,
    pub reason: String,
}

/// Errors produced while tearing down a network domain
#[derive(Debug, Error)]
pub enum TeardownError {
    /// A page fetch failed; the stage was aborted
    #[error("Failed to list {kind}s (page {page}): {source}")]
    Listing {
        kind: ResourceKind,
        page: u32,
        #[source]
        source: ApiError,
    },

    /// The provider refused a delete request
    #[error("Failed to delete {kind} '{id}': {source}")]
    DeletionRejected {
        kind: ResourceKind,
        id: String,
        #[source]
        source: ApiError,
    },

    /// The provider refused a power-off request
    #[error("Failed to power off server '{id}': {source}")]
    PowerOffRejected {
        id: String,
        #[source]
        source: ApiError,
    },

    /// A poll exceeded its timeout without observing the expected state
    #[error("Timed out after {timeout:?} waiting for {kind} '{id}' to be {transition}")]
    TransitionTimeout {
        kind: ResourceKind,
        id: String,
        transition: Transition,
        timeout: Duration,
    },

    /// The resource reached a state from which the transition cannot complete
    #[error("{kind} '{id}' cannot be {transition}: resource is {state}")]
    TransitionFailed {
        kind: ResourceKind,
        id: String,
        transition: Transition,
        state: String,
    },

    /// Polling a resource's state failed
    #[error("Failed to poll {kind} '{id}': {source}")]
    Transport {
        kind: ResourceKind,
        id: String,
        #[source]
        source: ApiError,
    },

    /// One or more concurrent server teardowns failed
    #[error(
        "Destroy failed for {} of {total} servers in network domain '{domain_id}'",
        failures.len()
    )]
    AggregateFailure {
        domain_id: String,
        total: usize,
        failures: Vec<ServerFailure>,
    },

    /// Network domain lookup found nothing
    #[error("Unable to find network domain '{name}' in datacenter '{datacenter_id}'")]
    DomainNotFound { name: String, datacenter_id: String },

    /// Lookup of a network domain failed
    #[error("Failed to resolve network domain '{name}': {source}")]
    Resolve {
        name: String,
        #[source]
        source: ApiError,
    },

    /// A pipeline stage failed
    #[error("Teardown stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<TeardownError>,
    },
}

impl TeardownError {
    /// Attribute this error to a pipeline stage
    pub fn in_stage(self, stage: Stage) -> Self {
        TeardownError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TeardownError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error beneath any stage attribution
    pub fn root(&self) -> &TeardownError {
        match self {
            TeardownError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this was (or wraps) a transition timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), TeardownError::TransitionTimeout { .. })
    }

    /// Check if this was (or wraps) a transport failure
    pub fn is_transport(&self) -> bool {
        match self.root() {
            TeardownError::Transport { .. } => true,
            TeardownError::Listing { source, .. }
            | TeardownError::DeletionRejected { source, .. }
            | TeardownError::PowerOffRejected { source, .. }
            | TeardownError::Resolve { source, .. } => matches!(source, ApiError::Transport(_)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_error() -> TeardownError {
        TeardownError::TransitionTimeout {
            kind: ResourceKind::Vlan,
            id: "vlan-1".into(),
            transition: Transition::Deleted,
            timeout: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_stage_attribution() {
        let err = timeout_error().in_stage(Stage::Vlans);
        assert_eq!(err.stage(), Some(Stage::Vlans));
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("Teardown stage 'VLANs' failed"));
    }

    #[test]
    fn test_unattributed_error_has_no_stage() {
        assert_eq!(timeout_error().stage(), None);
    }

    #[test]
    fn test_aggregate_failure_message() {
        let err = TeardownError::AggregateFailure {
            domain_id: "nd-1".into(),
            total: 10,
            failures: vec![
                ServerFailure {
                    server_id: "srv-1".into(),
                    server_name: "web-01".into(),
                    reason: "boom".into(),
                },
                ServerFailure {
                    server_id: "srv-2".into(),
                    server_name: "web-02".into(),
                    reason: "boom".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Destroy failed for 2 of 10 servers in network domain 'nd-1'"
        );
    }

    #[test]
    fn test_transport_classification() {
        let err = TeardownError::Listing {
            kind: ResourceKind::NatRule,
            page: 2,
            source: ApiError::transport(anyhow::anyhow!("connection refused")),
        }
        .in_stage(Stage::NatRules);
        assert!(err.is_transport());
        assert!(!err.is_timeout());

        let rejected = TeardownError::DeletionRejected {
            kind: ResourceKind::NatRule,
            id: "nat-1".into(),
            source: ApiError::Throttled,
        };
        assert!(!rejected.is_transport());
    }
}
