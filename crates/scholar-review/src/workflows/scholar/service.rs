use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::checklist::{ChecklistError, ChecklistFreeze, ChecklistState};
use super::classifier::{department_from_program, TextClassifier};
use super::directory::FacultyDirectory;
use super::domain::{
    ApplicationId, ApplicationSubmission, EnrollmentType, ExaminationId, ExaminationRecord,
    ExaminationSubmission, ReviewDecision, ScholarApplication, WorkflowState,
};
use super::grouping::{group_records, GroupedRecords};
use super::legacy::{self, LegacyApplicationRecord, LegacyDecodeError};
use super::ranking::{plan_publication, PublishResult, RankedCandidate, RankingConfig};
use super::repository::{
    ApplicationPatch, ApplicationStore, ApplicationUpdate, ExaminationPatch, ExaminationStore,
    StoreError,
};
use super::workflow::{self, InvalidTransition, Transition, WorkflowPatch};

/// Service composing the record stores, classifier, directory, and ranking policy.
pub struct ScholarReviewService<A, E> {
    applications: Arc<A>,
    examinations: Arc<E>,
    classifier: Arc<TextClassifier>,
    directory: Arc<FacultyDirectory>,
    ranking: RankingConfig,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EXAMINATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("sch-{id:06}"))
}

fn next_examination_id() -> ExaminationId {
    let id = EXAMINATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ExaminationId(format!("exam-{id:06}"))
}

/// Outcome of a batch transition. Refusals never abort the rest of the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTransitionReport {
    pub transition: Transition,
    pub applied: Vec<ApplicationId>,
    pub refused: Vec<InvalidTransition>,
    pub missing: Vec<ApplicationId>,
}

impl BatchTransitionReport {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            applied: Vec::new(),
            refused: Vec::new(),
            missing: Vec::new(),
        }
    }
}

impl<A, E> ScholarReviewService<A, E>
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    pub fn new(applications: Arc<A>, examinations: Arc<E>, directory: FacultyDirectory) -> Self {
        Self {
            applications,
            examinations,
            classifier: Arc::new(TextClassifier::standard()),
            directory: Arc::new(directory),
            ranking: RankingConfig::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: TextClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    pub fn directory(&self) -> &FacultyDirectory {
        &self.directory
    }

    /// Classify and store a new application. Classification only runs here.
    pub fn intake(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ScholarApplication, ReviewServiceError> {
        let mut record = self.classified_record(submission);
        record.id = self.applications.insert(record.clone())?;
        Ok(record)
    }

    /// Store a record exported from the legacy system, keeping its place in the workflow.
    ///
    /// The workflow columns are decoded before anything is written; records whose sentinels
    /// do not describe a reachable state are rejected.
    pub fn import_legacy(
        &self,
        legacy_record: LegacyApplicationRecord,
    ) -> Result<ScholarApplication, ReviewServiceError> {
        let (workflow, review) = legacy::decode(&legacy_record.workflow).map_err(|error| {
            warn!(
                application_no = %legacy_record.application_no,
                %error,
                "legacy workflow fields rejected"
            );
            error
        })?;

        let mut record = self.classified_record(ApplicationSubmission {
            application_no: legacy_record.application_no,
            scholar_name: legacy_record.scholar_name,
            program_text: legacy_record.program,
            institution_text: legacy_record.institution,
            faculty_name: legacy_record.faculty,
            department_name: legacy_record.department,
            enrollment_hint: legacy_record.enrollment_type,
        });
        record.workflow = workflow;
        record.review = review;
        record.verification_status = legacy_record.verification_status;
        record.eligibility_confirmed = legacy_record.eligibility_confirmed;

        record.id = self.applications.insert(record.clone())?;
        info!(
            application_id = %record.id,
            state = record.workflow.label(),
            "legacy application imported"
        );
        Ok(record)
    }

    fn classified_record(&self, submission: ApplicationSubmission) -> ScholarApplication {
        let classification = self.classifier.classify(
            &submission.program_text,
            submission.institution_text.as_deref(),
        );

        let faculty_name = supplied_or(submission.faculty_name, classification.faculty_name);
        let department_name =
            supplied_or(submission.department_name, classification.department_name);
        let enrollment_type = submission
            .enrollment_hint
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .map(EnrollmentType::from_label)
            .unwrap_or(classification.enrollment_type);

        let record = ScholarApplication {
            id: next_application_id(),
            application_no: submission.application_no,
            scholar_name: submission.scholar_name,
            program_text: submission.program_text,
            institution_text: submission.institution_text.unwrap_or_default(),
            faculty_name,
            department_name,
            enrollment_type,
            workflow: WorkflowState::Uploaded,
            review: None,
            checklist: ChecklistState::default(),
            verification_status: None,
            eligibility_confirmed: false,
        };

        if record.faculty_name.is_empty() || record.department_name.is_empty() {
            warn!(
                application_no = %record.application_no,
                program = %record.program_text,
                "intake could not classify programme; needs manual review"
            );
        }
        record
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ScholarApplication, ReviewServiceError> {
        let filter: &dyn Fn(&ScholarApplication) -> bool = &|record| record.id == *id;
        self.applications
            .fetch_all(Some(filter))?
            .into_iter()
            .next()
            .ok_or_else(|| ReviewServiceError::ApplicationNotFound(id.clone()))
    }

    pub fn forward_to_coordinator(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BatchTransitionReport, ReviewServiceError> {
        let directory = &self.directory;
        self.apply_batch(ids, Transition::ForwardToCoordinator, |record| {
            let faculty = directory
                .resolve_faculty(&record.faculty_name)
                .map(|entry| entry.name.as_str())
                .unwrap_or("");
            workflow::forward_to_coordinator(record, faculty)
        })
    }

    /// Coordinator intake: completes the two-phase handoff started by the director.
    pub fn accept_pickup(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BatchTransitionReport, ReviewServiceError> {
        self.apply_batch(ids, Transition::AcceptPickup, workflow::accept_pickup)
    }

    pub fn forward_to_department(
        &self,
        ids: &[ApplicationId],
        department_name: &str,
    ) -> Result<BatchTransitionReport, ReviewServiceError> {
        let directory = &self.directory;
        self.apply_batch(ids, Transition::ForwardToDepartment, |record| {
            let canonical = directory
                .resolve_department(&record.faculty_name, department_name)
                .unwrap_or_else(|| department_name.trim().to_string());
            workflow::forward_to_department(record, &canonical)
        })
    }

    pub fn return_to_coordinator(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BatchTransitionReport, ReviewServiceError> {
        self.apply_batch(
            ids,
            Transition::ReturnToCoordinator,
            workflow::return_to_coordinator,
        )
    }

    pub fn return_to_director(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BatchTransitionReport, ReviewServiceError> {
        self.apply_batch(ids, Transition::ReturnToDirector, workflow::return_to_director)
    }

    pub fn record_decision(
        &self,
        id: &ApplicationId,
        decision: ReviewDecision,
    ) -> Result<ScholarApplication, ReviewServiceError> {
        self.apply_single(id, Transition::RecordDecision, |record| {
            workflow::record_decision(record, decision)
        })
    }

    pub fn resubmit(&self, id: &ApplicationId) -> Result<ScholarApplication, ReviewServiceError> {
        self.apply_single(id, Transition::Resubmit, workflow::resubmit)
    }

    pub fn update_checklist(
        &self,
        id: &ApplicationId,
        item: &str,
        verified: bool,
    ) -> Result<ChecklistState, ReviewServiceError> {
        let record = self.get(id)?;
        let freeze = ChecklistFreeze::from_application(
            record.verification_status.as_deref(),
            record.eligibility_confirmed,
        );

        let mut checklist = record.checklist.clone();
        checklist.set_item(item, verified, freeze)?;
        // A freeze or a parallel item update since the read surfaces as `StoreError::Stale`.
        self.applications.update_by_id(
            id,
            &ApplicationPatch::Checklist {
                expected: record.checklist,
                next: checklist.clone(),
            },
        )?;
        Ok(checklist)
    }

    pub fn grouped(&self) -> Result<GroupedRecords, ReviewServiceError> {
        let records = self.applications.fetch_all(None)?;
        Ok(group_records(&records, &self.directory, &self.classifier))
    }

    pub fn verified_scholars(&self) -> Result<Vec<ScholarApplication>, ReviewServiceError> {
        let filter: &dyn Fn(&ScholarApplication) -> bool = &workflow::is_verified;
        Ok(self.applications.fetch_all(Some(filter))?)
    }

    pub fn query_bucket(&self) -> Result<Vec<ScholarApplication>, ReviewServiceError> {
        let filter: &dyn Fn(&ScholarApplication) -> bool = &workflow::is_open_query;
        Ok(self.applications.fetch_all(Some(filter))?)
    }

    pub fn record_examination(
        &self,
        submission: ExaminationSubmission,
    ) -> Result<ExaminationRecord, ReviewServiceError> {
        let department_name = submission
            .department_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| department_from_program(&submission.program_text));
        let enrollment_type = submission
            .enrollment_hint
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .map(EnrollmentType::from_label)
            .unwrap_or_else(|| {
                self.classifier
                    .rules()
                    .enrollment_for(&submission.program_text)
            });

        let mut record = ExaminationRecord {
            id: next_examination_id(),
            application_no: submission.application_no,
            scholar_name: submission.scholar_name,
            program_text: submission.program_text,
            department_name,
            enrollment_type,
            written: submission.written,
            interview: submission.interview,
            result_dir: submission.result_dir,
            dept_result: None,
        };

        record.id = self.examinations.insert(record.clone())?;
        Ok(record)
    }

    /// Rank list for a department without publishing it.
    pub fn rank(
        &self,
        department_name: &str,
        enrollment_type: EnrollmentType,
    ) -> Result<Vec<RankedCandidate>, ReviewServiceError> {
        let records = self.faculty_published(enrollment_type)?;
        let plan = plan_publication(
            department_name,
            enrollment_type,
            &records,
            &self.ranking,
            Utc::now(),
        );
        Ok(plan.ranked)
    }

    /// Idempotent department publication: already-marked records are skipped and the rest are
    /// marked in a single batch write.
    pub fn publish_department(
        &self,
        department_name: &str,
        enrollment_type: EnrollmentType,
    ) -> Result<PublishResult, ReviewServiceError> {
        let department_name = self
            .directory
            .canonical_department(department_name)
            .unwrap_or(department_name);
        let records = self.faculty_published(enrollment_type)?;
        let plan = plan_publication(
            department_name,
            enrollment_type,
            &records,
            &self.ranking,
            Utc::now(),
        );

        if !plan.to_update.is_empty() {
            self.examinations.update_batch(
                &plan.to_update,
                &ExaminationPatch::Publish(plan.marker.clone()),
            )?;
        }

        info!(
            department = %plan.department,
            enrollment = enrollment_type.label(),
            marker = %plan.marker.department_code,
            updated = plan.to_update.len(),
            skipped = plan.skipped,
            "department rank list published"
        );

        Ok(plan.into_result())
    }

    fn faculty_published(
        &self,
        enrollment_type: EnrollmentType,
    ) -> Result<Vec<ExaminationRecord>, ReviewServiceError> {
        let filter: &dyn Fn(&ExaminationRecord) -> bool = &|record| {
            record.enrollment_type == enrollment_type && record.faculty_published()
        };
        Ok(self.examinations.fetch_all(Some(filter))?)
    }

    fn apply_single<F>(
        &self,
        id: &ApplicationId,
        transition: Transition,
        step: F,
    ) -> Result<ScholarApplication, ReviewServiceError>
    where
        F: FnOnce(&ScholarApplication) -> Result<WorkflowPatch, InvalidTransition>,
    {
        let mut record = self.get(id)?;
        let next = step(&record).map_err(|refusal| {
            warn!(%refusal, "workflow transition refused");
            refusal
        })?;

        let patch = ApplicationPatch::Workflow {
            expected: WorkflowPatch::current(&record),
            next: next.clone(),
        };
        match self.applications.update_by_id(id, &patch) {
            Ok(()) => {}
            Err(StoreError::Stale(_)) => {
                let refusal = workflow::stale(&record, transition);
                warn!(%refusal, "workflow transition lost a concurrent update");
                return Err(refusal.into());
            }
            Err(error) => return Err(error.into()),
        }

        next.apply(&mut record);
        Ok(record)
    }

    /// Validate each record, then persist every accepted transition in one atomic batch.
    ///
    /// Records the store reports as stale are refused and the rest of the batch is retried;
    /// each retry is strictly smaller, so the loop ends.
    fn apply_batch<F>(
        &self,
        ids: &[ApplicationId],
        transition: Transition,
        step: F,
    ) -> Result<BatchTransitionReport, ReviewServiceError>
    where
        F: Fn(&ScholarApplication) -> Result<WorkflowPatch, InvalidTransition>,
    {
        let wanted: HashSet<&ApplicationId> = ids.iter().collect();
        let filter: &dyn Fn(&ScholarApplication) -> bool = &|record| wanted.contains(&record.id);
        let records = self.applications.fetch_all(Some(filter))?;

        let mut report = BatchTransitionReport::new(transition);
        let found: HashSet<&ApplicationId> = records.iter().map(|record| &record.id).collect();
        report.missing = ids
            .iter()
            .filter(|id| !found.contains(id))
            .cloned()
            .collect();

        let mut pending: Vec<(&ScholarApplication, ApplicationUpdate)> = Vec::new();
        for record in &records {
            match step(record) {
                Ok(next) => {
                    let patch = ApplicationPatch::Workflow {
                        expected: WorkflowPatch::current(record),
                        next,
                    };
                    pending.push((record, (record.id.clone(), patch)));
                }
                Err(refusal) => {
                    warn!(%refusal, "workflow transition refused");
                    report.refused.push(refusal);
                }
            }
        }

        while !pending.is_empty() {
            let updates: Vec<ApplicationUpdate> =
                pending.iter().map(|(_, update)| update.clone()).collect();

            match self.applications.update_batch(&updates) {
                Ok(()) => {
                    info!(%transition, count = updates.len(), "workflow batch applied");
                    report
                        .applied
                        .extend(updates.into_iter().map(|(id, _)| id));
                    break;
                }
                Err(StoreError::Stale(stale_ids)) => {
                    let stale_ids: HashSet<String> = stale_ids.into_iter().collect();
                    let before = pending.len();
                    pending.retain(|(record, _)| {
                        if stale_ids.contains(&record.id.0) {
                            let refusal = workflow::stale(record, transition);
                            warn!(%refusal, "workflow transition lost a concurrent update");
                            report.refused.push(refusal);
                            false
                        } else {
                            true
                        }
                    });
                    if pending.len() == before {
                        return Err(StoreError::Stale(stale_ids.into_iter().collect()).into());
                    }
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(report)
    }
}

fn supplied_or(supplied: Option<String>, inferred: String) -> String {
    supplied
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or(inferred)
}

/// Error raised by the scholar review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error("legacy record rejected: {0}")]
    Legacy(#[from] LegacyDecodeError),
}
