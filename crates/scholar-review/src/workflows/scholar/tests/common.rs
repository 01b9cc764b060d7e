use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::scholar::checklist::ChecklistState;
use crate::workflows::scholar::directory::FacultyDirectory;
use crate::workflows::scholar::domain::{
    ApplicationId, ApplicationSubmission, EnrollmentType, ExaminationId, ExaminationRecord,
    ExaminationSubmission, Mark, ScholarApplication, WorkflowState,
};
use crate::workflows::scholar::repository::{
    apply_application_updates, ApplicationPatch, ApplicationStore, ApplicationUpdate,
    ExaminationPatch, ExaminationStore, RecordFilter, StoreError,
};
use crate::workflows::scholar::{scholar_router, ScholarReviewService};

pub(super) const BIOMEDICAL_PROGRAM: &str =
    "Ph.d. - Biomedical Engineering (ph.d. - Pti - E And T)";
pub(super) const CHEMISTRY_PROGRAM: &str = "Ph.D. - Chemistry (Ph.D. - Ft - S And H)";

pub(super) type TestService = ScholarReviewService<MemoryApplicationStore, MemoryExaminationStore>;

pub(super) fn submission(application_no: &str, program_text: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        application_no: application_no.to_string(),
        scholar_name: format!("Scholar {application_no}"),
        program_text: program_text.to_string(),
        institution_text: None,
        faculty_name: None,
        department_name: None,
        enrollment_hint: None,
    }
}

pub(super) fn exam_submission(
    application_no: &str,
    department: &str,
    written: Mark,
    interview: Mark,
) -> ExaminationSubmission {
    ExaminationSubmission {
        application_no: application_no.to_string(),
        scholar_name: format!("Scholar {application_no}"),
        program_text: format!("Ph.D. - {department} (Ph.D. - Ft)"),
        department_name: Some(department.to_string()),
        enrollment_hint: Some("Full Time".to_string()),
        written,
        interview,
        result_dir: Some("Published_To_Faculty".to_string()),
    }
}

/// Bare record for pure-function tests; ids are caller supplied.
pub(super) fn application(
    id: &str,
    faculty: &str,
    department: &str,
    enrollment_type: EnrollmentType,
) -> ScholarApplication {
    ScholarApplication {
        id: ApplicationId(id.to_string()),
        application_no: format!("APP-{id}"),
        scholar_name: format!("Scholar {id}"),
        program_text: format!("Ph.D. - {department}"),
        institution_text: String::new(),
        faculty_name: faculty.to_string(),
        department_name: department.to_string(),
        enrollment_type,
        workflow: WorkflowState::Uploaded,
        review: None,
        checklist: ChecklistState::default(),
        verification_status: None,
        eligibility_confirmed: false,
    }
}

pub(super) fn exam_record(
    id: &str,
    department: &str,
    written: Mark,
    interview: Mark,
) -> ExaminationRecord {
    ExaminationRecord {
        id: ExaminationId(id.to_string()),
        application_no: format!("APP-{id}"),
        scholar_name: format!("Scholar {id}"),
        program_text: format!("Ph.D. - {department} (Ph.D. - Ft)"),
        department_name: department.to_string(),
        enrollment_type: EnrollmentType::FullTime,
        written,
        interview,
        result_dir: Some("Published_To_Faculty".to_string()),
        dept_result: None,
    }
}

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryApplicationStore>,
    Arc<MemoryExaminationStore>,
) {
    let applications = Arc::new(MemoryApplicationStore::default());
    let examinations = Arc::new(MemoryExaminationStore::default());
    let service = ScholarReviewService::new(
        applications.clone(),
        examinations.clone(),
        FacultyDirectory::standard(),
    );
    (service, applications, examinations)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    scholar_router(Arc::new(service))
}

/// Drive a freshly submitted record to the given department and return its id.
pub(super) fn with_department(service: &TestService, application_no: &str) -> ApplicationId {
    let record = service
        .intake(submission(application_no, BIOMEDICAL_PROGRAM))
        .expect("intake succeeds");
    let ids = vec![record.id.clone()];
    service.forward_to_coordinator(&ids).expect("forward");
    service.accept_pickup(&ids).expect("accept");
    let report = service
        .forward_to_department(&ids, "Biomedical Engineering")
        .expect("assign");
    assert_eq!(report.applied, ids);
    record.id
}

#[derive(Default)]
pub(super) struct MemoryApplicationStore {
    records: Mutex<BTreeMap<ApplicationId, ScholarApplication>>,
    /// When set, reads return this copy instead of the live records, like a lagging replica.
    snapshot: Mutex<Option<Vec<ScholarApplication>>>,
    fail_next_batch: AtomicBool,
    batch_writes: AtomicUsize,
}

impl MemoryApplicationStore {
    pub(super) fn stored(&self, id: &ApplicationId) -> Option<ScholarApplication> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
    }

    pub(super) fn confirm_eligibility(&self, id: &ApplicationId) {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if let Some(record) = guard.get_mut(id) {
            record.eligibility_confirmed = true;
        }
    }

    pub(super) fn batch_writes(&self) -> usize {
        self.batch_writes.load(Ordering::SeqCst)
    }

    /// Pin reads to the current contents; later writes are not visible to `fetch_all`.
    pub(super) fn freeze_reads(&self) {
        let current: Vec<_> = self
            .records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect();
        *self.snapshot.lock().expect("store mutex poisoned") = Some(current);
    }

    pub(super) fn fail_next_batch(&self) {
        self.fail_next_batch.store(true, Ordering::SeqCst);
    }
}

impl ApplicationStore for MemoryApplicationStore {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ScholarApplication>,
    ) -> Result<Vec<ScholarApplication>, StoreError> {
        let keep = |record: &ScholarApplication| filter.map(|keep| keep(record)).unwrap_or(true);
        if let Some(snapshot) = self.snapshot.lock().expect("store mutex poisoned").as_ref() {
            return Ok(snapshot.iter().filter(|record| keep(record)).cloned().collect());
        }

        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().filter(|record| keep(record)).cloned().collect())
    }

    fn update_by_id(&self, id: &ApplicationId, patch: &ApplicationPatch) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        apply_application_updates(&mut guard, &[(id.clone(), patch.clone())])
    }

    fn update_batch(&self, updates: &[ApplicationUpdate]) -> Result<(), StoreError> {
        if self.fail_next_batch.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write timed out".to_string()));
        }

        let mut guard = self.records.lock().expect("store mutex poisoned");
        apply_application_updates(&mut guard, updates)?;
        self.batch_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn insert(&self, record: ScholarApplication) -> Result<ApplicationId, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        let id = record.id.clone();
        guard.insert(id.clone(), record);
        Ok(id)
    }
}

#[derive(Default)]
pub(super) struct MemoryExaminationStore {
    records: Mutex<BTreeMap<ExaminationId, ExaminationRecord>>,
    last_batch: Mutex<Vec<ExaminationId>>,
    batch_writes: AtomicUsize,
}

impl MemoryExaminationStore {
    pub(super) fn all(&self) -> Vec<ExaminationRecord> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn batch_writes(&self) -> usize {
        self.batch_writes.load(Ordering::SeqCst)
    }

    pub(super) fn last_batch(&self) -> Vec<ExaminationId> {
        self.last_batch.lock().expect("store mutex poisoned").clone()
    }
}

impl ExaminationStore for MemoryExaminationStore {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ExaminationRecord>,
    ) -> Result<Vec<ExaminationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.map(|keep| keep(*record)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn update_by_id(
        &self,
        id: &ExaminationId,
        patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(record);
        Ok(())
    }

    fn update_batch(
        &self,
        ids: &[ExaminationId],
        patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if ids.iter().any(|id| !guard.contains_key(id)) {
            return Err(StoreError::NotFound);
        }
        for id in ids {
            if let Some(record) = guard.get_mut(id) {
                patch.apply(record);
            }
        }
        *self.last_batch.lock().expect("store mutex poisoned") = ids.to_vec();
        self.batch_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn insert(&self, record: ExaminationRecord) -> Result<ExaminationId, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        let id = record.id.clone();
        guard.insert(id.clone(), record);
        Ok(id)
    }
}

pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn fetch_all(
        &self,
        _filter: RecordFilter<'_, ScholarApplication>,
    ) -> Result<Vec<ScholarApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_by_id(
        &self,
        _id: &ApplicationId,
        _patch: &ApplicationPatch,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_batch(&self, _updates: &[ApplicationUpdate]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: ScholarApplication) -> Result<ApplicationId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

impl ExaminationStore for UnavailableStore {
    fn fetch_all(
        &self,
        _filter: RecordFilter<'_, ExaminationRecord>,
    ) -> Result<Vec<ExaminationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_by_id(
        &self,
        _id: &ExaminationId,
        _patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_batch(
        &self,
        _ids: &[ExaminationId],
        _patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: ExaminationRecord) -> Result<ExaminationId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
