use std::fmt;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::user::UserRef;
use crate::error::{AppError, AppResult};
use crate::services::TicketBackend;

/// Per-user calls needed to bring a ticket's assignees in line with a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub assign: Vec<UserRef>,
    pub unassign: Vec<UserRef>,
}

impl AssignmentPlan {
    /// Users selected now but not at open time are assigned; users selected
    /// at open time but not now are unassigned.
    pub fn for_save(snapshot: &[UserRef], current: &[UserRef]) -> Self {
        Self {
            assign: difference(current, snapshot),
            unassign: difference(snapshot, current),
        }
    }

    /// Everyone attached to the ticket either at open time or in the draft.
    pub fn for_delete(snapshot: &[UserRef], current: &[UserRef]) -> Self {
        let mut unassign = snapshot.to_vec();
        unassign.extend(difference(current, snapshot));
        Self {
            assign: Vec::new(),
            unassign,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.unassign.is_empty()
    }
}

fn difference(left: &[UserRef], right: &[UserRef]) -> Vec<UserRef> {
    left.iter()
        .filter(|user| !right.iter().any(|other| other.user_id == user.user_id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentAction {
    Assign,
    Unassign,
}

impl fmt::Display for AssignmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentAction::Assign => write!(f, "assign"),
            AssignmentAction::Unassign => write!(f, "unassign"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentFailure {
    pub action: AssignmentAction,
    pub user: UserRef,
    pub reason: String,
}

/// Combined result of both phases. Every call has settled by the time this exists.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub ticket_id: String,
    pub assigned: Vec<UserRef>,
    pub unassigned: Vec<UserRef>,
    pub failures: Vec<AssignmentFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> AppResult<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        let detail = self
            .failures
            .iter()
            .map(|failure| {
                format!(
                    "{} {} ({})",
                    failure.action, failure.user.user_name, failure.reason
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::PartialSync(format!(
            "ticket {}: {detail}",
            self.ticket_id
        )))
    }
}

/// Runs the assign phase, then the unassign phase. Calls within a phase run
/// concurrently and all of them settle before the next phase starts. No call
/// is retried and successful calls are never rolled back.
pub async fn reconcile_assignments(
    backend: &dyn TicketBackend,
    internal_id: &str,
    plan: AssignmentPlan,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        ticket_id: internal_id.to_string(),
        ..BatchOutcome::default()
    };
    if plan.is_empty() {
        debug!(ticket = internal_id, "assignees unchanged");
        return outcome;
    }

    let assign_results = join_all(
        plan.assign
            .iter()
            .map(|user| backend.assign_user(&user.user_id, internal_id)),
    )
    .await;
    record_phase(
        &mut outcome,
        AssignmentAction::Assign,
        plan.assign,
        assign_results,
    );

    let unassign_results = join_all(
        plan.unassign
            .iter()
            .map(|user| backend.unassign_user(&user.user_id, internal_id)),
    )
    .await;
    record_phase(
        &mut outcome,
        AssignmentAction::Unassign,
        plan.unassign,
        unassign_results,
    );

    if outcome.is_complete() {
        info!(
            ticket = internal_id,
            assigned = outcome.assigned.len(),
            unassigned = outcome.unassigned.len(),
            "assignments synchronized"
        );
    } else {
        warn!(
            ticket = internal_id,
            failed = outcome.failures.len(),
            "assignment sync left ticket partially updated"
        );
    }
    outcome
}

fn record_phase(
    outcome: &mut BatchOutcome,
    action: AssignmentAction,
    users: Vec<UserRef>,
    results: Vec<AppResult<()>>,
) {
    for (user, result) in users.into_iter().zip(results) {
        match result {
            Ok(()) => match action {
                AssignmentAction::Assign => outcome.assigned.push(user),
                AssignmentAction::Unassign => outcome.unassigned.push(user),
            },
            Err(err) => outcome.failures.push(AssignmentFailure {
                action,
                user,
                reason: err.to_string(),
            }),
        }
    }
}
