use super::{AgentStatus, StatusTracker};

/// Marks an agent `InProgress` for its lifetime.
///
/// [`StatusGuard::finish`] records the real outcome. A guard dropped without
/// finishing (early return, panic unwinding, cancelled future) records
/// `Failed`, so an agent never stays `InProgress`.
#[derive(Debug)]
pub struct StatusGuard {
    tracker: StatusTracker,
    agent_id: String,
    settled: bool,
}

impl StatusGuard {
    /// Set `agent_id` to `InProgress` and arm the guard
    #[must_use]
    pub fn begin(tracker: &StatusTracker, agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        tracker.update_agent_status(&agent_id, AgentStatus::InProgress);
        Self {
            tracker: tracker.clone(),
            agent_id,
            settled: false,
        }
    }

    /// Record the final status and disarm the guard
    pub fn finish(mut self, status: AgentStatus) {
        self.tracker.update_agent_status(&self.agent_id, status);
        self.settled = true;
    }

    /// Record `Completed` or `Failed` depending on `success`
    pub fn finish_with(self, success: bool) {
        let status = if success {
            AgentStatus::Completed
        } else {
            AgentStatus::Failed
        };
        self.finish(status);
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker
                .update_agent_status(&self.agent_id, AgentStatus::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_records_outcome() {
        let tracker = StatusTracker::new();
        let guard = StatusGuard::begin(&tracker, "design");
        assert_eq!(tracker.get_agent_status("design"), AgentStatus::InProgress);

        guard.finish_with(true);
        assert_eq!(tracker.get_agent_status("design"), AgentStatus::Completed);
    }

    #[test]
    fn test_drop_without_finish_fails() {
        let tracker = StatusTracker::new();
        {
            let _guard = StatusGuard::begin(&tracker, "design");
        }
        assert_eq!(tracker.get_agent_status("design"), AgentStatus::Failed);
    }

    #[test]
    fn test_panic_unwinding_fails() {
        let tracker = StatusTracker::new();
        let inner = tracker.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = StatusGuard::begin(&inner, "design");
            panic!("handler exploded");
        }));

        assert!(result.is_err());
        assert_eq!(tracker.get_agent_status("design"), AgentStatus::Failed);
    }
}
