//! Report status transitions.
//!
//! ```text
//! Pending ──verify──▶ Verified
//!    │                   │
//!    └──────accept───────┴──▶ Assigned ──resolve──▶ Resolved
//!                               ▲   │
//!                               └───┘ accept (reassignment)
//! ```
//!
//! Every other combination is rejected with `409 Conflict`. Resolved is
//! terminal.

use crate::core::error::{AppError, Result};
use crate::features::reports::models::ReportStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    /// A moderator confirms the report is genuine
    Verify,
    /// A handler takes responsibility for the report
    Accept,
    /// A handler attaches a resolution to the current assignment
    Resolve,
}

impl ReportAction {
    fn describe(self) -> &'static str {
        match self {
            ReportAction::Verify => "verified",
            ReportAction::Accept => "accepted for handling",
            ReportAction::Resolve => "resolved",
        }
    }
}

/// Status a report moves to when `action` is applied in state `current`
pub fn transition(current: ReportStatus, action: ReportAction) -> Result<ReportStatus> {
    use ReportAction::*;
    use ReportStatus::*;

    match (current, action) {
        (Pending, Verify) => Ok(Verified),
        (Pending | Verified | Assigned, Accept) => Ok(Assigned),
        (Assigned, Resolve) => Ok(Resolved),
        (current, action) => Err(AppError::Conflict(format!(
            "A {} report cannot be {}",
            current.to_string().to_lowercase(),
            action.describe()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [ReportStatus; 4] = [
        ReportStatus::Pending,
        ReportStatus::Verified,
        ReportStatus::Assigned,
        ReportStatus::Resolved,
    ];
    const ACTIONS: [ReportAction; 3] = [
        ReportAction::Verify,
        ReportAction::Accept,
        ReportAction::Resolve,
    ];

    fn rank(status: ReportStatus) -> u8 {
        match status {
            ReportStatus::Pending => 0,
            ReportStatus::Verified => 1,
            ReportStatus::Assigned => 2,
            ReportStatus::Resolved => 3,
        }
    }

    #[test]
    fn test_happy_path() {
        let verified = transition(ReportStatus::Pending, ReportAction::Verify).unwrap();
        let assigned = transition(verified, ReportAction::Accept).unwrap();
        let resolved = transition(assigned, ReportAction::Resolve).unwrap();
        assert_eq!(resolved, ReportStatus::Resolved);
    }

    #[test]
    fn test_accept_straight_from_pending_and_reassignment() {
        assert_eq!(
            transition(ReportStatus::Pending, ReportAction::Accept).unwrap(),
            ReportStatus::Assigned
        );
        assert_eq!(
            transition(ReportStatus::Assigned, ReportAction::Accept).unwrap(),
            ReportStatus::Assigned
        );
    }

    #[test]
    fn test_resolve_requires_assignment() {
        for status in [ReportStatus::Pending, ReportStatus::Verified] {
            assert!(matches!(
                transition(status, ReportAction::Resolve),
                Err(AppError::Conflict(_))
            ));
        }
    }

    #[test]
    fn test_resolved_is_terminal() {
        for action in ACTIONS {
            assert!(transition(ReportStatus::Resolved, action).is_err());
        }
    }

    #[test]
    fn test_verify_only_from_pending() {
        for status in [
            ReportStatus::Verified,
            ReportStatus::Assigned,
            ReportStatus::Resolved,
        ] {
            assert!(transition(status, ReportAction::Verify).is_err());
        }
    }

    #[test]
    fn test_status_never_regresses() {
        for status in STATES {
            for action in ACTIONS {
                if let Ok(next) = transition(status, action) {
                    assert!(rank(next) >= rank(status), "{:?} -> {:?}", status, next);
                    if next == ReportStatus::Resolved {
                        assert_eq!(status, ReportStatus::Assigned);
                    }
                }
            }
        }
    }

    #[test]
    fn test_conflict_message() {
        match transition(ReportStatus::Resolved, ReportAction::Accept) {
            Err(AppError::Conflict(msg)) => {
                assert_eq!(msg, "A resolved report cannot be accepted for handling")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
