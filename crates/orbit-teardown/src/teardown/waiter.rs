//! Resource waiter
//!
//! Blocks (asynchronously) until a resource reaches the terminal state of an
//! operation that was just issued against it: removal after a delete, or
//! powered-off after a power-off. Every wait is bounded by the configured
//! timeout and never retried.

use super::error::TeardownError;
use crate::api::{ApiError, CloudControlApi};
use crate::wait::{WaitConfig, WaitError, wait_for_resource};
use orbit_common::{LifecycleState, ResourceKind, ResourceStatus};
use tracing::debug;

/// The terminal state a wait is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Transition {
    /// Resource no longer exists
    #[strum(serialize = "deleted")]
    Deleted,
    /// Server settled with its power off
    #[strum(serialize = "powered off")]
    PoweredOff,
}

/// What a single observation means for a transition
#[derive(Debug, PartialEq, Eq)]
enum Progress {
    Reached,
    InFlight,
    Failed(String),
}

impl Transition {
    /// Judge one observation of the resource against this transition.
    ///
    /// A resource still reading `NORMAL` right after a delete is treated as
    /// in flight: the provider may accept a delete before its state catches up.
    fn judge(self, observed: Option<&ResourceStatus>) -> Progress {
        match (self, observed) {
            (Transition::Deleted, None) => Progress::Reached,
            (Transition::Deleted, Some(status)) => match &status.state {
                LifecycleState::Other(state) => Progress::Failed(state.clone()),
                _ => Progress::InFlight,
            },
            (Transition::PoweredOff, None) => Progress::Failed("missing".to_string()),
            (Transition::PoweredOff, Some(status)) => match &status.state {
                LifecycleState::Normal if status.started != Some(true) => Progress::Reached,
                LifecycleState::Other(state) => Progress::Failed(state.clone()),
                _ => Progress::InFlight,
            },
        }
    }
}

/// Why a single poll stopped the wait
enum PollStop {
    Api(ApiError),
    Failed(String),
}

impl std::fmt::Debug for PollStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStop::Api(e) => write!(f, "{e}"),
            PollStop::Failed(state) => write!(f, "unexpected state {state}"),
        }
    }
}

/// Wait until `resource_id` reaches `transition`, or fail.
///
/// # Errors
/// - [`TeardownError::TransitionTimeout`] if `config.timeout` elapses first
/// - [`TeardownError::TransitionFailed`] if the resource lands in a state the
///   transition cannot complete from
/// - [`TeardownError::Transport`] if a state poll fails
pub async fn await_terminal<C: CloudControlApi>(
    api: &C,
    kind: ResourceKind,
    resource_id: &str,
    transition: Transition,
    config: &WaitConfig,
) -> Result<(), TeardownError> {
    debug!(
        kind = %kind,
        resource_id = %resource_id,
        transition = %transition,
        timeout_secs = config.timeout.as_secs(),
        "Waiting for resource"
    );

    let resource_name = format!("{kind} '{resource_id}'");
    let result = wait_for_resource(
        config,
        || async move {
            let observed = api
                .get_resource(kind, resource_id)
                .await
                .map_err(PollStop::Api)?;
            match transition.judge(observed.as_ref()) {
                Progress::Reached => Ok(true),
                Progress::InFlight => Ok(false),
                Progress::Failed(state) => Err(PollStop::Failed(state)),
            }
        },
        &resource_name,
    )
    .await;

    result.map_err(|e| match e {
        WaitError::Timeout { timeout, .. } => TeardownError::TransitionTimeout {
            kind,
            id: resource_id.to_string(),
            transition,
            timeout,
        },
        WaitError::Check(PollStop::Api(source)) => TeardownError::Transport {
            kind,
            id: resource_id.to_string(),
            source,
        },
        WaitError::Check(PollStop::Failed(state)) => TeardownError::TransitionFailed {
            kind,
            id: resource_id.to_string(),
            transition,
            state,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: LifecycleState) -> ResourceStatus {
        ResourceStatus::new(state)
    }

    #[test]
    fn test_deleted_reached_when_absent() {
        assert_eq!(Transition::Deleted.judge(None), Progress::Reached);
    }

    #[test]
    fn test_deleted_in_flight_while_present() {
        for state in [
            LifecycleState::PendingDelete,
            LifecycleState::Normal,
            LifecycleState::PendingChange,
        ] {
            assert_eq!(
                Transition::Deleted.judge(Some(&status(state))),
                Progress::InFlight
            );
        }
    }

    #[test]
    fn test_deleted_fails_on_failure_state() {
        assert_eq!(
            Transition::Deleted.judge(Some(&status(LifecycleState::Other(
                "FAILED_DELETE".into()
            )))),
            Progress::Failed("FAILED_DELETE".into())
        );
    }

    #[test]
    fn test_powered_off_requires_settled_stopped_server() {
        let stopped = ResourceStatus::server(LifecycleState::Normal, false);
        let still_running = ResourceStatus::server(LifecycleState::Normal, true);
        let changing = ResourceStatus::server(LifecycleState::PendingChange, true);

        assert_eq!(Transition::PoweredOff.judge(Some(&stopped)), Progress::Reached);
        assert_eq!(
            Transition::PoweredOff.judge(Some(&still_running)),
            Progress::InFlight
        );
        assert_eq!(Transition::PoweredOff.judge(Some(&changing)), Progress::InFlight);
    }

    #[test]
    fn test_powered_off_fails_when_server_vanishes() {
        assert!(matches!(
            Transition::PoweredOff.judge(None),
            Progress::Failed(_)
        ));
    }

    #[test]
    fn test_transition_display() {
        assert_eq!(Transition::Deleted.to_string(), "deleted");
        assert_eq!(Transition::PoweredOff.to_string(), "powered off");
    }
}
