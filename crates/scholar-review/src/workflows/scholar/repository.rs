use std::collections::BTreeMap;

use serde::Serialize;

use super::checklist::{ChecklistFreeze, ChecklistState};
use super::domain::{
    ApplicationId, ExaminationId, ExaminationRecord, PublicationMarker, ScholarApplication,
};
use super::legacy::{self, LegacyWorkflowFields};
use super::workflow::WorkflowPatch;

/// Optional row filter passed to `fetch_all`.
pub type RecordFilter<'a, T> = Option<&'a dyn Fn(&T) -> bool>;

/// One record's share of an atomic batch write.
pub type ApplicationUpdate = (ApplicationId, ApplicationPatch);

/// Partial update applied to a stored application. Each variant carries the fields it was
/// computed from; stores refuse the write with [`StoreError::Stale`] once those have moved.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationPatch {
    Workflow {
        expected: WorkflowPatch,
        next: WorkflowPatch,
    },
    Checklist {
        expected: ChecklistState,
        next: ChecklistState,
    },
}

impl ApplicationPatch {
    /// Whether the stored record still matches the snapshot the patch was derived from.
    pub fn applies_to(&self, record: &ScholarApplication) -> bool {
        match self {
            Self::Workflow { expected, .. } => {
                record.workflow == expected.state && record.review == expected.review
            }
            Self::Checklist { expected, .. } => {
                let freeze = ChecklistFreeze::from_application(
                    record.verification_status.as_deref(),
                    record.eligibility_confirmed,
                );
                record.checklist == *expected && !freeze.is_frozen()
            }
        }
    }

    pub fn apply(&self, record: &mut ScholarApplication) {
        match self {
            Self::Workflow { next, .. } => next.apply(record),
            Self::Checklist { next, .. } => record.checklist = next.clone(),
        }
    }
}

/// Guarded, all-or-nothing application of `updates` for map-backed stores.
///
/// Unknown ids fail with `NotFound`; records whose guard no longer holds fail with `Stale`
/// listing every such id. Nothing is written unless every update applies.
pub fn apply_application_updates(
    records: &mut BTreeMap<ApplicationId, ScholarApplication>,
    updates: &[ApplicationUpdate],
) -> Result<(), StoreError> {
    let mut stale = Vec::new();
    for (id, patch) in updates {
        let record = records.get(id).ok_or(StoreError::NotFound)?;
        if !patch.applies_to(record) {
            stale.push(id.0.clone());
        }
    }
    if !stale.is_empty() {
        return Err(StoreError::Stale(stale));
    }

    for (id, patch) in updates {
        if let Some(record) = records.get_mut(id) {
            patch.apply(record);
        }
    }
    Ok(())
}

/// Partial update applied to a stored examination record.
#[derive(Debug, Clone, PartialEq)]
pub enum ExaminationPatch {
    Publish(PublicationMarker),
}

impl ExaminationPatch {
    pub fn apply(&self, record: &mut ExaminationRecord) {
        match self {
            Self::Publish(marker) => record.dept_result = Some(marker.clone()),
        }
    }
}

/// Storage abstraction for scholar applications.
///
/// Writes are conditional: a patch whose guard no longer matches the stored record must be
/// rejected with [`StoreError::Stale`]. `update_batch` is atomic across every id it names.
pub trait ApplicationStore: Send + Sync {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ScholarApplication>,
    ) -> Result<Vec<ScholarApplication>, StoreError>;
    fn update_by_id(&self, id: &ApplicationId, patch: &ApplicationPatch) -> Result<(), StoreError>;
    fn update_batch(&self, updates: &[ApplicationUpdate]) -> Result<(), StoreError>;
    fn insert(&self, record: ScholarApplication) -> Result<ApplicationId, StoreError>;
}

/// Storage abstraction for examination outcomes.
pub trait ExaminationStore: Send + Sync {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ExaminationRecord>,
    ) -> Result<Vec<ExaminationRecord>, StoreError>;
    fn update_by_id(&self, id: &ExaminationId, patch: &ExaminationPatch)
        -> Result<(), StoreError>;
    fn update_batch(
        &self,
        ids: &[ExaminationId],
        patch: &ExaminationPatch,
    ) -> Result<(), StoreError>;
    fn insert(&self, record: ExaminationRecord) -> Result<ExaminationId, StoreError>;
}

/// Error enumeration for store failures; passed through to callers untouched.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("records changed since they were read: {}", .0.join(", "))]
    Stale(Vec<String>),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Externally visible application status in the legacy field layout.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub application_no: String,
    pub faculty_name: String,
    pub department_name: String,
    pub enrollment_type: &'static str,
    pub state: &'static str,
    #[serde(flatten)]
    pub legacy: LegacyWorkflowFields,
    pub checklist_complete: bool,
}

impl ScholarApplication {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            application_no: self.application_no.clone(),
            faculty_name: self.faculty_name.clone(),
            department_name: self.department_name.clone(),
            enrollment_type: self.enrollment_type.label(),
            state: self.workflow.label(),
            legacy: legacy::encode(&self.workflow, self.review.as_ref()),
            checklist_complete: self.checklist.is_complete(),
        }
    }
}
