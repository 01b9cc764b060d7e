//! Scholar admission review: programme classification, directory reconciliation, grouping,
//! the ownership workflow, and department rank publication.

pub mod checklist;
pub mod classifier;
pub mod directory;
pub mod domain;
pub mod grouping;
pub mod legacy;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use checklist::{
    ChecklistError, ChecklistFreeze, ChecklistItem, ChecklistState, DocumentStatus,
    RequirementKind,
};
pub use classifier::{department_from_program, ClassifierRules, TextClassifier};
pub use directory::{
    department_short_code, DirectoryError, DirectoryMatch, FacultyDirectory, FacultyEntry,
    MatchKind,
};
pub use domain::{
    ApplicationId, ApplicationSubmission, Classification, EnrollmentType, ExaminationId,
    ExaminationRecord, ExaminationSubmission, Mark, MarkParseError, Owner, PublicationMarker,
    ReviewDecision, ScholarApplication, TotalMarks, WorkflowState,
};
pub use grouping::{group_records, GroupedRecords, GroupingSummary, UnassignedReason};
pub use legacy::{LegacyApplicationRecord, LegacyDecodeError, LegacyWorkflowFields};
pub use ranking::{
    plan_publication, rank_candidates, total_marks, PublicationPlan, PublishResult,
    RankedCandidate, RankingConfig,
};
pub use repository::{
    apply_application_updates, ApplicationPatch, ApplicationStatusView, ApplicationStore,
    ApplicationUpdate, ExaminationPatch, ExaminationStore, RecordFilter, StoreError,
};
pub use router::scholar_router;
pub use service::{BatchTransitionReport, ReviewServiceError, ScholarReviewService};
pub use workflow::{InvalidTransition, Transition, WorkflowPatch};
