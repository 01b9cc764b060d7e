use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::classifier::TextClassifier;
use super::directory::{FacultyDirectory, MatchKind};
use super::domain::{ApplicationId, EnrollmentType, ScholarApplication};

/// Records per enrollment type; every type is always present.
pub type EnrollmentBuckets = BTreeMap<EnrollmentType, Vec<ScholarApplication>>;

pub type DepartmentGroups = BTreeMap<String, EnrollmentBuckets>;

/// Why a record could not be placed in the faculty/department tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnassignedReason {
    #[error("classification ambiguous (faculty '{faculty}', department '{department}')")]
    ClassificationAmbiguous { faculty: String, department: String },
    #[error("department '{department}' not found in directory for faculty '{faculty}'")]
    DirectoryMismatch { faculty: String, department: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedRecord {
    pub record: ScholarApplication,
    pub reason: UnassignedReason,
}

/// Faculty -> department -> enrollment type partition of scholar records.
#[derive(Debug, Clone, Default)]
pub struct GroupedRecords {
    pub faculties: BTreeMap<String, DepartmentGroups>,
    pub unassigned: Vec<UnassignedRecord>,
    /// Records placed through the cross-faculty fallback; counted separately so completeness
    /// reports can tell them apart from confident routing.
    pub cross_faculty_matches: Vec<ApplicationId>,
}

impl GroupedRecords {
    pub fn get(&self, faculty: &str) -> Option<&DepartmentGroups> {
        self.faculties.get(faculty)
    }

    pub fn bucket(
        &self,
        faculty: &str,
        department: &str,
        enrollment_type: EnrollmentType,
    ) -> Option<&[ScholarApplication]> {
        self.faculties
            .get(faculty)?
            .get(department)?
            .get(&enrollment_type)
            .map(Vec::as_slice)
    }

    pub fn assigned_count(&self) -> usize {
        self.faculties
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn summary(&self) -> GroupingSummary {
        let faculties = self
            .faculties
            .iter()
            .map(|(faculty, departments)| FacultySummary {
                faculty: faculty.clone(),
                departments: departments
                    .iter()
                    .map(|(department, buckets)| {
                        let counts = EnrollmentType::ordered()
                            .into_iter()
                            .map(|kind| {
                                let count = buckets.get(&kind).map(Vec::len).unwrap_or(0);
                                (kind.label(), count)
                            })
                            .collect::<BTreeMap<_, _>>();
                        let total = counts.values().sum();
                        DepartmentSummary {
                            department: department.clone(),
                            counts,
                            total,
                        }
                    })
                    .collect(),
            })
            .collect();

        GroupingSummary {
            faculties,
            assigned: self.assigned_count(),
            unassigned: self
                .unassigned
                .iter()
                .map(|entry| UnassignedView {
                    application_id: entry.record.id.clone(),
                    application_no: entry.record.application_no.clone(),
                    reason: entry.reason.clone(),
                })
                .collect(),
            cross_faculty_matches: self.cross_faculty_matches.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingSummary {
    pub faculties: Vec<FacultySummary>,
    pub assigned: usize,
    pub unassigned: Vec<UnassignedView>,
    pub cross_faculty_matches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultySummary {
    pub faculty: String,
    pub departments: Vec<DepartmentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub counts: BTreeMap<&'static str, usize>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnassignedView {
    pub application_id: ApplicationId,
    pub application_no: String,
    #[serde(flatten)]
    pub reason: UnassignedReason,
}

fn empty_buckets() -> EnrollmentBuckets {
    EnrollmentType::ordered()
        .into_iter()
        .map(|kind| (kind, Vec::new()))
        .collect()
}

/// Partition records by faculty, department, and enrollment type.
///
/// Every directory department is present even with no scholars. Records that cannot be placed
/// land in `unassigned` with the reason, so no record is dropped or counted twice.
pub fn group_records(
    records: &[ScholarApplication],
    directory: &FacultyDirectory,
    classifier: &TextClassifier,
) -> GroupedRecords {
    let mut grouped = GroupedRecords::default();

    for faculty in &directory.faculties {
        let departments = grouped.faculties.entry(faculty.name.clone()).or_default();
        for department in &faculty.departments {
            departments.insert(department.clone(), empty_buckets());
        }
    }

    for record in records {
        let needs_inference =
            record.faculty_name.trim().is_empty() || record.department_name.trim().is_empty();
        let derived = needs_inference.then(|| {
            classifier.classify(&record.program_text, Some(record.institution_text.as_str()))
        });

        let faculty_hint = pick_hint(&record.faculty_name, derived.as_ref().map(|c| &c.faculty_name));
        let department_hint = pick_hint(
            &record.department_name,
            derived.as_ref().map(|c| &c.department_name),
        );

        let resolved = if department_hint.is_empty() {
            None
        } else {
            directory.resolve(&faculty_hint, &department_hint)
        };

        match resolved {
            Some(matched) => {
                if matched.kind == MatchKind::CrossFaculty {
                    grouped.cross_faculty_matches.push(record.id.clone());
                }
                grouped
                    .faculties
                    .entry(matched.faculty)
                    .or_default()
                    .entry(matched.department)
                    .or_insert_with(empty_buckets)
                    .entry(record.enrollment_type)
                    .or_default()
                    .push(record.clone());
            }
            None => {
                let reason = if faculty_hint.is_empty() || department_hint.is_empty() {
                    UnassignedReason::ClassificationAmbiguous {
                        faculty: faculty_hint,
                        department: department_hint,
                    }
                } else {
                    UnassignedReason::DirectoryMismatch {
                        faculty: faculty_hint,
                        department: department_hint,
                    }
                };
                debug!(application_id = %record.id, %reason, "record left unassigned");
                grouped.unassigned.push(UnassignedRecord {
                    record: record.clone(),
                    reason,
                });
            }
        }
    }

    grouped
}

fn pick_hint(stored: &str, derived: Option<&String>) -> String {
    let stored = stored.trim();
    if !stored.is_empty() {
        return stored.to_string();
    }
    derived.map(|value| value.trim().to_string()).unwrap_or_default()
}
