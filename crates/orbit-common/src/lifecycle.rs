//! Resource lifecycle states reported by CloudControl
//!
//! Every resource carries a `state` string. Deletion and power operations
//! move a resource through one of the `PENDING_*` states before it settles
//! back to `NORMAL` (or disappears, for deletes).

/// Lifecycle state of a CloudControl resource
///
/// Unknown provider states (for example `FAILED_DELETE`) are kept verbatim
/// in `Other` so they can be surfaced in errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
pub enum LifecycleState {
    /// Resource is stable and no operation is in progress
    #[strum(serialize = "NORMAL")]
    Normal,
    /// Resource is being deployed
    #[strum(serialize = "PENDING_ADD")]
    PendingAdd,
    /// Resource is being changed (e.g. power state)
    #[strum(serialize = "PENDING_CHANGE")]
    PendingChange,
    /// Resource deletion has been accepted but not completed
    #[strum(serialize = "PENDING_DELETE")]
    PendingDelete,
    /// Any other provider state, typically a failure state
    #[strum(default)]
    Other(String),
}

impl LifecycleState {
    /// Parse a provider state string; never fails
    pub fn parse(s: &str) -> Self {
        // `#[strum(default)]` captures anything unrecognised
        s.parse().unwrap_or_else(|_| Self::Other(s.to_string()))
    }

    /// Check if an operation is still in flight
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingAdd | Self::PendingChange | Self::PendingDelete
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(state) => f.write_str(state),
            known => {
                let name: &'static str = known.into();
                f.write_str(name)
            }
        }
    }
}

/// One observation of a resource's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    /// Current lifecycle state
    pub state: LifecycleState,
    /// Power state, for resources that have one (servers)
    pub started: Option<bool>,
}

impl ResourceStatus {
    /// Status of a resource without a power state
    pub fn new(state: LifecycleState) -> Self {
        Self {
            state,
            started: None,
        }
    }

    /// Status of a server
    pub fn server(state: LifecycleState, started: bool) -> Self {
        Self {
            state,
            started: Some(started),
        }
    }
}
