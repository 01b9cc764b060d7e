//! Compatibility layer for records stored with string sentinels (`currentOwner`, `status`,
//! `facultyForward`, `deptReview`, `Published_To_<code>`). Everything inside the crate works on
//! [`WorkflowState`]; these conversions only run at the persistence boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Owner, PublicationMarker, ReviewDecision, WorkflowState};

pub const STATUS_UPLOADED: &str = "uploaded";
pub const FORWARDED_TO_FACULTY_PREFIX: &str = "Forwarded to ";
pub const FORWARDED_TO_DEPARTMENT_PREFIX: &str = "FORWARDED_TO_";
pub const BACK_TO_COORDINATOR: &str = "Back_To_RC";
pub const BACK_TO_DIRECTOR: &str = "Back_To_Director";
pub const PUBLISHED_TO_PREFIX: &str = "Published_To_";

/// Workflow columns as they appear in stored legacy records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyWorkflowFields {
    pub current_owner: String,
    pub status: String,
    #[serde(default)]
    pub faculty_forward: Option<String>,
    #[serde(default)]
    pub dept_review: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Application exported from the legacy store, carrying its workflow columns verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyApplicationRecord {
    pub application_no: String,
    pub scholar_name: String,
    pub program: String,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub enrollment_type: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub eligibility_confirmed: bool,
    #[serde(flatten)]
    pub workflow: LegacyWorkflowFields,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyDecodeError {
    #[error("unknown owner '{0}'")]
    UnknownOwner(String),
    #[error("owner '{owner}' is inconsistent with status '{status}' and forward marker {forward:?}")]
    InconsistentState {
        owner: String,
        status: String,
        forward: Option<String>,
    },
    #[error("department review '{0}' is not an approve, reject, or query decision")]
    UnknownDecision(String),
    #[error("'{0}' is not a department publication marker")]
    InvalidMarker(String),
}

pub fn encode(state: &WorkflowState, review: Option<&ReviewDecision>) -> LegacyWorkflowFields {
    let (status, faculty_forward) = match state {
        WorkflowState::Uploaded => (STATUS_UPLOADED.to_string(), None),
        WorkflowState::AwaitingCoordinatorPickup { faculty_label }
        | WorkflowState::WithCoordinator { faculty_label } => {
            (format!("{FORWARDED_TO_FACULTY_PREFIX}{faculty_label}"), None)
        }
        WorkflowState::WithDepartment { department_code } => {
            (format!("{FORWARDED_TO_DEPARTMENT_PREFIX}{department_code}"), None)
        }
        WorkflowState::ReturnedToCoordinator { department_code } => (
            format!("{FORWARDED_TO_DEPARTMENT_PREFIX}{department_code}"),
            Some(BACK_TO_COORDINATOR.to_string()),
        ),
        WorkflowState::ReturnedToDirector { department_code } => (
            format!("{FORWARDED_TO_DEPARTMENT_PREFIX}{department_code}"),
            Some(BACK_TO_DIRECTOR.to_string()),
        ),
    };

    let (dept_review, rejection_reason) = match review {
        None => (None, None),
        Some(ReviewDecision::Approved { remarks }) => (
            Some(match remarks {
                Some(remarks) if !remarks.trim().is_empty() => format!("Approved: {remarks}"),
                _ => "Approved".to_string(),
            }),
            None,
        ),
        Some(ReviewDecision::Rejected { reason }) => {
            (Some("Rejected".to_string()), Some(reason.clone()))
        }
        Some(ReviewDecision::Queried { question }) => {
            (Some(format!("Query: {question}")), None)
        }
    };

    LegacyWorkflowFields {
        current_owner: state.owner().label().to_string(),
        status,
        faculty_forward,
        dept_review,
        rejection_reason,
    }
}

pub fn decode(
    fields: &LegacyWorkflowFields,
) -> Result<(WorkflowState, Option<ReviewDecision>), LegacyDecodeError> {
    let owner = parse_owner(&fields.current_owner)?;
    let forward = fields
        .faculty_forward
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let status = fields.status.trim();

    let inconsistent = || LegacyDecodeError::InconsistentState {
        owner: fields.current_owner.clone(),
        status: fields.status.clone(),
        forward: fields.faculty_forward.clone(),
    };

    let department_code = status
        .strip_prefix(FORWARDED_TO_DEPARTMENT_PREFIX)
        .map(str::to_string);
    let faculty_label = status
        .strip_prefix(FORWARDED_TO_FACULTY_PREFIX)
        .map(str::to_string);

    let state = match (owner, forward) {
        (Owner::Department, Some(_)) => return Err(inconsistent()),
        (Owner::Department, None) => WorkflowState::WithDepartment {
            department_code: department_code.ok_or_else(inconsistent)?,
        },
        (Owner::ResearchCoordinator, Some(BACK_TO_COORDINATOR)) => {
            WorkflowState::ReturnedToCoordinator {
                department_code: department_code.ok_or_else(inconsistent)?,
            }
        }
        (Owner::ResearchCoordinator, None) => WorkflowState::WithCoordinator {
            faculty_label: faculty_label.ok_or_else(inconsistent)?,
        },
        (Owner::Director, Some(BACK_TO_DIRECTOR)) => WorkflowState::ReturnedToDirector {
            department_code: department_code.ok_or_else(inconsistent)?,
        },
        (Owner::Director, None) if status.eq_ignore_ascii_case(STATUS_UPLOADED) => {
            WorkflowState::Uploaded
        }
        (Owner::Director, None) => WorkflowState::AwaitingCoordinatorPickup {
            faculty_label: faculty_label.ok_or_else(inconsistent)?,
        },
        _ => return Err(inconsistent()),
    };

    let review = decode_review(
        fields.dept_review.as_deref(),
        fields.rejection_reason.as_deref(),
    )?;

    Ok((state, review))
}

fn parse_owner(value: &str) -> Result<Owner, LegacyDecodeError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "director" => Ok(Owner::Director),
        "research_coordinator" => Ok(Owner::ResearchCoordinator),
        "department" => Ok(Owner::Department),
        _ => Err(LegacyDecodeError::UnknownOwner(value.to_string())),
    }
}

fn decode_review(
    dept_review: Option<&str>,
    rejection_reason: Option<&str>,
) -> Result<Option<ReviewDecision>, LegacyDecodeError> {
    let Some(raw) = dept_review.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let lowered = raw.to_ascii_lowercase();
    let detail = raw
        .split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|rest| !rest.is_empty());

    if lowered.contains("query") {
        Ok(Some(ReviewDecision::Queried {
            question: detail.unwrap_or_default(),
        }))
    } else if lowered.contains("reject") {
        Ok(Some(ReviewDecision::Rejected {
            reason: rejection_reason
                .map(|reason| reason.trim().to_string())
                .or(detail)
                .unwrap_or_default(),
        }))
    } else if lowered.contains("approve") {
        Ok(Some(ReviewDecision::Approved { remarks: detail }))
    } else {
        Err(LegacyDecodeError::UnknownDecision(raw.to_string()))
    }
}

pub fn publication_marker_to_legacy(marker: &PublicationMarker) -> String {
    format!("{PUBLISHED_TO_PREFIX}{}", marker.department_code)
}

/// Legacy markers carry no timestamp, so the caller supplies the one to record.
pub fn publication_marker_from_legacy(
    raw: &str,
    published_at: DateTime<Utc>,
) -> Result<PublicationMarker, LegacyDecodeError> {
    raw.trim()
        .strip_prefix(PUBLISHED_TO_PREFIX)
        .filter(|code| !code.is_empty())
        .map(|code| PublicationMarker {
            department_code: code.to_string(),
            published_at,
        })
        .ok_or_else(|| LegacyDecodeError::InvalidMarker(raw.to_string()))
}
