use super::AgentStatus;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared registry of agent status.
///
/// Cloning is cheap and every clone sees the same entries. Unknown agent ids
/// report [`AgentStatus::Pending`].
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    statuses: Arc<DashMap<String, AgentStatus>>,
}

impl StatusTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of an agent
    #[must_use]
    pub fn get_agent_status(&self, agent_id: &str) -> AgentStatus {
        self.statuses
            .get(agent_id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Set an agent's status, returning the previous one.
    ///
    /// Transitions outside the lifecycle state machine are still applied but
    /// logged.
    pub fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> AgentStatus {
        let previous = self
            .statuses
            .insert(agent_id.to_string(), status)
            .unwrap_or_default();

        if previous.can_transition_to(status) {
            debug!(agent = %agent_id, from = %previous, to = %status, "Agent status changed");
        } else {
            warn!(agent = %agent_id, from = %previous, to = %status, "Unexpected agent status transition");
        }
        previous
    }

    /// Every known agent and its status, sorted by id
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, AgentStatus> {
        self.statuses
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Number of tracked agents
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Check if no agent has reported a status
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
