//! Status transition validation and execution.
//!
//! Every status change goes through here: validate first (read-only), then
//! execute via the tracker-internal handle resolved during validation. The
//! "already in target status" case is a no-op guard, structurally distinct
//! from a true rejection so callers can treat it as success when they want
//! idempotent behavior.
//!
//! Target names are matched against tracker-reported transition names with
//! exact case-insensitive comparison; no substring fallback.

use crate::tracker::IssueTracker;
use crate::{Error, Result};

/// Verdict of a transition validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionVerdict {
    /// Legal; carries the tracker-internal handle to invoke.
    Allowed { handle: String },
    /// The task is already in the target status (no-op guard).
    AlreadyInTarget,
    /// No transition to the target exists from the current status.
    NotAvailable,
}

/// Outcome of a validation, including the status it was judged against.
#[derive(Debug, Clone)]
pub struct TransitionCheck {
    /// Raw tracker status at validation time
    pub current_status: String,
    pub verdict: TransitionVerdict,
}

impl TransitionCheck {
    /// True when the transition may be executed.
    pub fn allowed(&self) -> bool {
        matches!(self.verdict, TransitionVerdict::Allowed { .. })
    }

    /// Human-readable rejection reason, if rejected.
    pub fn reason(&self, target: &str) -> Option<String> {
        match &self.verdict {
            TransitionVerdict::Allowed { .. } => None,
            TransitionVerdict::AlreadyInTarget => {
                Some(format!("already in {} status", target))
            }
            TransitionVerdict::NotAvailable => Some(format!(
                "no transition to {} available from {}",
                target, self.current_status
            )),
        }
    }
}

/// Result of [`perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition was executed.
    Applied,
    /// The task was already in the target status; nothing was done.
    NoOp,
}

/// Validate a requested status change without side effects.
///
/// Fails with `Error::NotFound` if the task does not resolve. Never calls
/// `apply_transition`.
pub fn validate(
    tracker: &dyn IssueTracker,
    task_id: &str,
    target_status: &str,
) -> Result<TransitionCheck> {
    let task = tracker.get_task(task_id)?;

    if task.status.eq_ignore_ascii_case(target_status) {
        return Ok(TransitionCheck {
            current_status: task.status,
            verdict: TransitionVerdict::AlreadyInTarget,
        });
    }

    let transitions = tracker.list_transitions(task_id)?;
    let verdict = transitions
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(target_status))
        .map(|t| TransitionVerdict::Allowed { handle: t.handle })
        .unwrap_or(TransitionVerdict::NotAvailable);

    Ok(TransitionCheck {
        current_status: task.status,
        verdict,
    })
}

/// Validate and, if legal, execute a status change.
///
/// `NoOp` when the task is already in the target status; an
/// `InvalidTransition` error when the target is unreachable. State is never
/// partially applied: the tracker call happens only after a clean
/// validation.
pub fn perform(
    tracker: &dyn IssueTracker,
    task_id: &str,
    target_status: &str,
) -> Result<TransitionOutcome> {
    let check = validate(tracker, task_id, target_status)?;
    match check.verdict {
        TransitionVerdict::Allowed { handle } => {
            tracker.apply_transition(task_id, &handle)?;
            Ok(TransitionOutcome::Applied)
        }
        TransitionVerdict::AlreadyInTarget => Ok(TransitionOutcome::NoOp),
        TransitionVerdict::NotAvailable => Err(Error::InvalidTransition {
            task_id: task_id.to_string(),
            current_status: check.current_status.clone(),
            reason: check
                .reason(target_status)
                .unwrap_or_else(|| "transition rejected".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::fake::FakeTracker;

    fn tracker_with_task() -> FakeTracker {
        let tracker = FakeTracker::new();
        tracker.add_task("WL-1", "Configure logger", "Selected for Development");
        tracker.set_transitions(
            "Selected for Development",
            &[("In Progress", "21"), ("Won't Do", "61")],
        );
        tracker
    }

    #[test]
    fn test_validate_allowed_resolves_handle() {
        let tracker = tracker_with_task();
        let check = validate(&tracker, "WL-1", "In Progress").unwrap();
        assert_eq!(check.current_status, "Selected for Development");
        assert_eq!(
            check.verdict,
            TransitionVerdict::Allowed {
                handle: "21".to_string()
            }
        );
        assert!(check.allowed());
        assert!(check.reason("In Progress").is_none());
    }

    #[test]
    fn test_validate_case_insensitive_target() {
        let tracker = tracker_with_task();
        let check = validate(&tracker, "WL-1", "in progress").unwrap();
        assert!(check.allowed());
    }

    #[test]
    fn test_validate_already_in_target() {
        let tracker = tracker_with_task();
        let check = validate(&tracker, "WL-1", "Selected for Development").unwrap();
        assert_eq!(check.verdict, TransitionVerdict::AlreadyInTarget);
        assert_eq!(
            check.reason("Selected for Development").unwrap(),
            "already in Selected for Development status"
        );
    }

    #[test]
    fn test_validate_not_available() {
        let tracker = tracker_with_task();
        let check = validate(&tracker, "WL-1", "Done").unwrap();
        assert_eq!(check.verdict, TransitionVerdict::NotAvailable);
        let reason = check.reason("Done").unwrap();
        assert!(reason.contains("no transition to Done"));
        assert!(reason.contains("Selected for Development"));
    }

    #[test]
    fn test_validate_unknown_task() {
        let tracker = FakeTracker::new();
        let err = validate(&tracker, "WL-404", "Done").unwrap_err();
        assert!(matches!(err, crate::Error::NotFound(_)));
    }

    #[test]
    fn test_validate_never_applies() {
        let tracker = tracker_with_task();
        validate(&tracker, "WL-1", "In Progress").unwrap();
        validate(&tracker, "WL-1", "Done").unwrap();
        assert!(tracker.applied_transitions().is_empty());
    }

    #[test]
    fn test_perform_applies_transition() {
        let tracker = tracker_with_task();
        let outcome = perform(&tracker, "WL-1", "In Progress").unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        assert_eq!(tracker.status_of("WL-1"), "In Progress");
        assert_eq!(
            tracker.applied_transitions(),
            vec![("WL-1".to_string(), "21".to_string())]
        );
    }

    #[test]
    fn test_perform_noop_when_already_in_target() {
        let tracker = tracker_with_task();
        let outcome = perform(&tracker, "WL-1", "selected for development").unwrap();
        assert_eq!(outcome, TransitionOutcome::NoOp);
        assert!(tracker.applied_transitions().is_empty());
    }

    #[test]
    fn test_perform_rejection_has_no_side_effect() {
        let tracker = tracker_with_task();
        let err = perform(&tracker, "WL-1", "Done").unwrap_err();
        match err {
            crate::Error::InvalidTransition {
                task_id,
                current_status,
                ..
            } => {
                assert_eq!(task_id, "WL-1");
                assert_eq!(current_status, "Selected for Development");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        assert!(tracker.applied_transitions().is_empty());
        assert_eq!(tracker.status_of("WL-1"), "Selected for Development");
    }
}
