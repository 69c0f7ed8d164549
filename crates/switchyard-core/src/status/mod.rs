//! Status - per-agent lifecycle state
//!
//! Agents move through a small state machine:
//!
//! ```text
//! Pending -> InProgress -> Completed          (initialize)
//! Completed | Failed -> InProgress -> Completed | Failed   (execute)
//! Completed | Failed -> Pending               (shutdown)
//! ```
//!
//! `Failed` is never terminal.

/// Drop guard that settles an in-progress status.
pub mod guard;
/// Concurrent status registry.
pub mod tracker;

pub use guard::StatusGuard;
pub use tracker::StatusTracker;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Not started, or shut down
    #[default]
    Pending,
    /// Initializing or executing
    InProgress,
    /// Last operation succeeded
    Completed,
    /// Last operation failed
    Failed,
}

impl AgentStatus {
    /// Whether `self -> next` is part of the lifecycle state machine.
    ///
    /// Staying in the same state is always allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        use AgentStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, InProgress)
                    | (InProgress, Completed)
                    | (InProgress, Failed)
                    | (Completed, InProgress)
                    | (Failed, InProgress)
                    | (Completed, Pending)
                    | (Failed, Pending)
            )
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::AgentStatus::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Failed));
        assert!(Failed.can_transition_to(InProgress));
        assert!(Completed.can_transition_to(Pending));
        assert!(Completed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
    }
}
