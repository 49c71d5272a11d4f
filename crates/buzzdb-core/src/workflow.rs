//! Team workflow status lifecycle for classified posts.

use serde::{Deserialize, Serialize};

/// Workflow status of a classified post.
///
/// Status only moves forward through the lifecycle; the rank comparison in
/// [`WorkflowStatus::advance`] is the single guard every transition routes
/// through, so operating on an already-resolved post can never drag it back
/// to an earlier stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    New,
    Acknowledged,
    InProgress,
    Resolved,
    Closed,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 5] = [
        WorkflowStatus::New,
        WorkflowStatus::Acknowledged,
        WorkflowStatus::InProgress,
        WorkflowStatus::Resolved,
        WorkflowStatus::Closed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::New => "new",
            WorkflowStatus::Acknowledged => "acknowledged",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Resolved => "resolved",
            WorkflowStatus::Closed => "closed",
        }
    }

    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            WorkflowStatus::New => 0,
            WorkflowStatus::Acknowledged => 1,
            WorkflowStatus::InProgress => 2,
            WorkflowStatus::Resolved => 3,
            WorkflowStatus::Closed => 4,
        }
    }

    /// Returns the status after proposing `candidate` from `self`.
    ///
    /// Keeps whichever status ranks higher — a transition can pull a post
    /// forward but never push it back.
    #[must_use]
    pub fn advance(self, candidate: WorkflowStatus) -> WorkflowStatus {
        if candidate.rank() > self.rank() {
            candidate
        } else {
            self
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(WorkflowStatus::New),
            "acknowledged" => Ok(WorkflowStatus::Acknowledged),
            "in_progress" => Ok(WorkflowStatus::InProgress),
            "resolved" => Ok(WorkflowStatus::Resolved),
            "closed" => Ok(WorkflowStatus::Closed),
            other => Err(format!("unknown workflow status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_forward() {
        assert_eq!(
            WorkflowStatus::New.advance(WorkflowStatus::Acknowledged),
            WorkflowStatus::Acknowledged
        );
        assert_eq!(
            WorkflowStatus::Acknowledged.advance(WorkflowStatus::InProgress),
            WorkflowStatus::InProgress
        );
    }

    #[test]
    fn advance_never_regresses() {
        // assign (-> in_progress) after resolve must not move status back
        assert_eq!(
            WorkflowStatus::Resolved.advance(WorkflowStatus::InProgress),
            WorkflowStatus::Resolved
        );
        assert_eq!(
            WorkflowStatus::Closed.advance(WorkflowStatus::New),
            WorkflowStatus::Closed
        );
    }

    #[test]
    fn advance_is_idempotent_at_same_rank() {
        assert_eq!(
            WorkflowStatus::Resolved.advance(WorkflowStatus::Resolved),
            WorkflowStatus::Resolved
        );
    }

    #[test]
    fn ranks_are_strictly_ordered() {
        let ranks: Vec<u8> = WorkflowStatus::ALL.iter().map(|s| s.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in WorkflowStatus::ALL {
            let parsed: WorkflowStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
