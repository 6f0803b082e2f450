//! Delete confirmation state machine.
//!
//! Gates the destructive delete behind an explicit, separately dispatched
//! confirmation. At most one target is ever pending; a second request
//! overwrites the first instead of silently queueing two. Transitions are
//! pure -- the adapter layer dispatches the confirmed target to the session
//! controller.

/// States: `Idle` -> `AwaitingConfirmation(session_id)` -> `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    AwaitingConfirmation { session_id: String },
}

impl DeleteConfirmation {
    /// Marks a session as the pending deletion target, overwriting any
    /// previously pending target.
    pub fn request_delete(&mut self, session_id: impl Into<String>) {
        *self = DeleteConfirmation::AwaitingConfirmation {
            session_id: session_id.into(),
        };
    }

    /// Confirms the pending deletion, returning the target and resetting to
    /// `Idle`. A no-op returning `None` when nothing is pending.
    pub fn confirm(&mut self) -> Option<String> {
        match std::mem::take(self) {
            DeleteConfirmation::Idle => None,
            DeleteConfirmation::AwaitingConfirmation { session_id } => Some(session_id),
        }
    }

    /// Abandons the pending deletion without side effects.
    pub fn cancel(&mut self) {
        *self = DeleteConfirmation::Idle;
    }

    /// The currently pending target, if any.
    pub fn pending(&self) -> Option<&str> {
        match self {
            DeleteConfirmation::Idle => None,
            DeleteConfirmation::AwaitingConfirmation { session_id } => Some(session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_returns_target_and_resets() {
        let mut flow = DeleteConfirmation::default();
        flow.request_delete("s1");
        assert_eq!(flow.pending(), Some("s1"));

        assert_eq!(flow.confirm().as_deref(), Some("s1"));
        assert_eq!(flow, DeleteConfirmation::Idle);
    }

    #[test]
    fn confirm_without_request_is_noop() {
        let mut flow = DeleteConfirmation::default();
        assert_eq!(flow.confirm(), None);
        assert_eq!(flow, DeleteConfirmation::Idle);
    }

    #[test]
    fn cancel_after_request_never_deletes() {
        let mut flow = DeleteConfirmation::default();
        flow.request_delete("s1");
        flow.cancel();

        assert_eq!(flow.pending(), None);
        // A confirm after cancel must not resurrect the old target.
        assert_eq!(flow.confirm(), None);
    }

    #[test]
    fn second_request_overwrites_pending_target() {
        let mut flow = DeleteConfirmation::default();
        flow.request_delete("s1");
        flow.request_delete("s2");

        // Two rapid delete requests must not operate on two targets; only
        // the latest survives to confirmation.
        assert_eq!(flow.confirm().as_deref(), Some("s2"));
        assert_eq!(flow.confirm(), None);
    }
}
