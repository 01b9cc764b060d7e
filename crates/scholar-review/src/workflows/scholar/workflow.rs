//! Ownership/status state machine for scholar applications.
//!
//! Transition functions are pure: they inspect a record and either return the
//! [`WorkflowPatch`] to persist or an [`InvalidTransition`] refusal. A refused transition never
//! touches the record, which makes stale or repeated requests detectable instead of silently
//! overwriting ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::directory::department_short_code;
use super::domain::{
    faculty_short_label, ApplicationId, ReviewDecision, ScholarApplication, WorkflowState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    ForwardToCoordinator,
    AcceptPickup,
    ForwardToDepartment,
    RecordDecision,
    ReturnToCoordinator,
    ReturnToDirector,
    Resubmit,
}

impl Transition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ForwardToCoordinator => "forward to research coordinator",
            Self::AcceptPickup => "accept coordinator pickup",
            Self::ForwardToDepartment => "forward to department",
            Self::RecordDecision => "record department decision",
            Self::ReturnToCoordinator => "return to research coordinator",
            Self::ReturnToDirector => "return to director",
            Self::Resubmit => "resubmit to department",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Refusal raised when a record does not satisfy a transition's precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("cannot {transition} application {application_id} from state {from_state}: {reason}")]
pub struct InvalidTransition {
    pub application_id: ApplicationId,
    pub transition: Transition,
    pub from_state: &'static str,
    pub reason: String,
}

/// Workflow fields written back to the store after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPatch {
    pub state: WorkflowState,
    pub review: Option<ReviewDecision>,
}

impl WorkflowPatch {
    /// The record's workflow fields as they stand, used as the write guard.
    pub fn current(record: &ScholarApplication) -> Self {
        Self {
            state: record.workflow.clone(),
            review: record.review.clone(),
        }
    }

    pub fn apply(&self, record: &mut ScholarApplication) {
        record.workflow = self.state.clone();
        record.review = self.review.clone();
    }
}

fn refuse(
    record: &ScholarApplication,
    transition: Transition,
    reason: impl Into<String>,
) -> InvalidTransition {
    InvalidTransition {
        application_id: record.id.clone(),
        transition,
        from_state: record.workflow.label(),
        reason: reason.into(),
    }
}

/// Refusal for a transition validated against a read the store has since moved past.
pub fn stale(record: &ScholarApplication, transition: Transition) -> InvalidTransition {
    refuse(
        record,
        transition,
        "record changed since it was read; reload and retry",
    )
}

/// Director hands the record to the faculty's research coordinator. Ownership stays with the
/// director until the coordinator accepts the pickup.
pub fn forward_to_coordinator(
    record: &ScholarApplication,
    faculty_name: &str,
) -> Result<WorkflowPatch, InvalidTransition> {
    let transition = Transition::ForwardToCoordinator;
    if record.workflow != WorkflowState::Uploaded {
        return Err(refuse(record, transition, "only uploaded records can be forwarded"));
    }

    let faculty_label = faculty_short_label(faculty_name);
    if faculty_label.is_empty() {
        return Err(refuse(
            record,
            transition,
            "record has no resolved faculty; route to manual review",
        ));
    }

    Ok(WorkflowPatch {
        state: WorkflowState::AwaitingCoordinatorPickup { faculty_label },
        review: record.review.clone(),
    })
}

pub fn accept_pickup(record: &ScholarApplication) -> Result<WorkflowPatch, InvalidTransition> {
    match &record.workflow {
        WorkflowState::AwaitingCoordinatorPickup { faculty_label } => Ok(WorkflowPatch {
            state: WorkflowState::WithCoordinator {
                faculty_label: faculty_label.clone(),
            },
            review: record.review.clone(),
        }),
        _ => Err(refuse(
            record,
            Transition::AcceptPickup,
            "record is not awaiting coordinator pickup",
        )),
    }
}

pub fn forward_to_department(
    record: &ScholarApplication,
    department_name: &str,
) -> Result<WorkflowPatch, InvalidTransition> {
    let transition = Transition::ForwardToDepartment;
    if !matches!(record.workflow, WorkflowState::WithCoordinator { .. }) {
        return Err(refuse(
            record,
            transition,
            "only coordinator-owned records can be assigned to a department",
        ));
    }

    if department_name.trim().is_empty() {
        return Err(refuse(record, transition, "department name is blank"));
    }

    Ok(WorkflowPatch {
        state: WorkflowState::WithDepartment {
            department_code: department_short_code(department_name),
        },
        review: None,
    })
}

/// Department decision. A query keeps ownership with the department; the record reaches the
/// director's query bucket only through the normal return transitions.
pub fn record_decision(
    record: &ScholarApplication,
    decision: ReviewDecision,
) -> Result<WorkflowPatch, InvalidTransition> {
    let transition = Transition::RecordDecision;
    if !matches!(record.workflow, WorkflowState::WithDepartment { .. }) {
        return Err(refuse(record, transition, "record is not with a department"));
    }

    if let Some(existing) = &record.review {
        if !existing.is_query() {
            return Err(refuse(
                record,
                transition,
                format!("decision already recorded ({})", existing.label()),
            ));
        }
    }

    if let ReviewDecision::Rejected { reason } = &decision {
        if reason.trim().is_empty() {
            return Err(refuse(record, transition, "rejection requires a reason"));
        }
    }

    Ok(WorkflowPatch {
        state: record.workflow.clone(),
        review: Some(decision),
    })
}

pub fn return_to_coordinator(
    record: &ScholarApplication,
) -> Result<WorkflowPatch, InvalidTransition> {
    let transition = Transition::ReturnToCoordinator;
    let WorkflowState::WithDepartment { department_code } = &record.workflow else {
        return Err(refuse(record, transition, "record is not with a department"));
    };

    if record.review.is_none() {
        return Err(refuse(
            record,
            transition,
            "department has not recorded a decision",
        ));
    }

    Ok(WorkflowPatch {
        state: WorkflowState::ReturnedToCoordinator {
            department_code: department_code.clone(),
        },
        review: record.review.clone(),
    })
}

pub fn return_to_director(record: &ScholarApplication) -> Result<WorkflowPatch, InvalidTransition> {
    match &record.workflow {
        WorkflowState::ReturnedToCoordinator { department_code } => Ok(WorkflowPatch {
            state: WorkflowState::ReturnedToDirector {
                department_code: department_code.clone(),
            },
            review: record.review.clone(),
        }),
        _ => Err(refuse(
            record,
            Transition::ReturnToDirector,
            "record has not been returned by its department",
        )),
    }
}

/// Manual re-entry after a rejection: clears the decision and hands the record back to the
/// department that rejected it.
pub fn resubmit(record: &ScholarApplication) -> Result<WorkflowPatch, InvalidTransition> {
    let transition = Transition::Resubmit;
    if !record
        .review
        .as_ref()
        .map(ReviewDecision::is_rejection)
        .unwrap_or(false)
    {
        return Err(refuse(record, transition, "only rejected records can be resubmitted"));
    }

    let department_code = record
        .workflow
        .department_code()
        .ok_or_else(|| refuse(record, transition, "record has no department assignment"))?;

    Ok(WorkflowPatch {
        state: WorkflowState::WithDepartment {
            department_code: department_code.to_string(),
        },
        review: None,
    })
}

/// Records that completed the review loop with a non-query decision.
pub fn is_verified(record: &ScholarApplication) -> bool {
    record.workflow.is_terminal()
        && record
            .review
            .as_ref()
            .map(|decision| !decision.is_query())
            .unwrap_or(false)
}

/// Records returned to the director carrying an open department query.
pub fn is_open_query(record: &ScholarApplication) -> bool {
    record.workflow.is_terminal()
        && record
            .review
            .as_ref()
            .map(ReviewDecision::is_query)
            .unwrap_or(false)
}
