use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::department_from_program;
use super::directory::{department_short_code, normalize_department};
use super::domain::{
    EnrollmentType, ExaminationId, ExaminationRecord, Mark, PublicationMarker, TotalMarks,
};
use super::legacy;

pub const DEFAULT_QUALIFYING_TOTAL: u32 = 60;

/// Qualification policy for rank lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub qualifying_total: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            qualifying_total: DEFAULT_QUALIFYING_TOTAL,
        }
    }
}

/// Written plus interview, rounded. One absent component counts as zero; both absent is
/// `Absent`.
pub fn total_marks(written: Mark, interview: Mark) -> TotalMarks {
    if written.is_absent() && interview.is_absent() {
        return TotalMarks::Absent;
    }

    let sum = written.value_or_zero() + interview.value_or_zero();
    TotalMarks::Score(sum.round().max(0.0) as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub examination_id: ExaminationId,
    pub application_no: String,
    pub scholar_name: String,
    pub written: Mark,
    pub interview: Mark,
    pub total: TotalMarks,
    pub partial_absence: bool,
    pub rank: usize,
    pub qualified: bool,
}

fn compare_totals(left: TotalMarks, right: TotalMarks) -> Ordering {
    match (left, right) {
        (TotalMarks::Score(a), TotalMarks::Score(b)) => b.cmp(&a),
        (TotalMarks::Score(_), TotalMarks::Absent) => Ordering::Less,
        (TotalMarks::Absent, TotalMarks::Score(_)) => Ordering::Greater,
        (TotalMarks::Absent, TotalMarks::Absent) => Ordering::Equal,
    }
}

/// Rank by descending total with fully absent candidates last. Ties keep input order; rank is
/// the 1-based position after sorting.
pub fn rank_candidates<'a, I>(records: I, config: &RankingConfig) -> Vec<RankedCandidate>
where
    I: IntoIterator<Item = &'a ExaminationRecord>,
{
    let mut candidates: Vec<RankedCandidate> = records
        .into_iter()
        .map(|record| {
            let total = total_marks(record.written, record.interview);
            RankedCandidate {
                examination_id: record.id.clone(),
                application_no: record.application_no.clone(),
                scholar_name: record.scholar_name.clone(),
                written: record.written,
                interview: record.interview,
                total,
                partial_absence: total != TotalMarks::Absent
                    && (record.written.is_absent() || record.interview.is_absent()),
                rank: 0,
                qualified: total
                    .score()
                    .map(|score| score >= config.qualifying_total)
                    .unwrap_or(false),
            }
        })
        .collect();

    candidates.sort_by(|a, b| compare_totals(a.total, b.total));
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = index + 1;
    }
    candidates
}

/// Department the examination record belongs to, falling back to the programme text.
pub fn resolved_department(record: &ExaminationRecord) -> String {
    let stored = record.department_name.trim();
    if stored.is_empty() {
        department_from_program(&record.program_text)
    } else {
        stored.to_string()
    }
}

/// Pure publish computation; the service turns `to_update` into a single batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationPlan {
    pub department: String,
    pub enrollment_type: EnrollmentType,
    pub marker: PublicationMarker,
    pub ranked: Vec<RankedCandidate>,
    pub to_update: Vec<ExaminationId>,
    pub skipped: usize,
}

impl PublicationPlan {
    pub fn already_published(&self) -> bool {
        !self.ranked.is_empty() && self.to_update.is_empty()
    }

    pub fn into_result(self) -> PublishResult {
        let already_published = self.already_published();
        PublishResult {
            department: self.department,
            enrollment_type: self.enrollment_type,
            marker: legacy::publication_marker_to_legacy(&self.marker),
            ranked: self.ranked,
            newly_published: self.to_update,
            skipped: self.skipped,
            already_published,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishResult {
    pub department: String,
    pub enrollment_type: EnrollmentType,
    pub marker: String,
    pub ranked: Vec<RankedCandidate>,
    pub newly_published: Vec<ExaminationId>,
    /// Records that already carried this department's marker.
    pub skipped: usize,
    pub already_published: bool,
}

/// Select the faculty-published records for a department and enrollment type, rank them, and
/// work out which still need the department marker.
pub fn plan_publication(
    department_name: &str,
    enrollment_type: EnrollmentType,
    records: &[ExaminationRecord],
    config: &RankingConfig,
    published_at: DateTime<Utc>,
) -> PublicationPlan {
    let target = normalize_department(department_name);
    let department_code = department_short_code(department_name);

    let qualifying: Vec<&ExaminationRecord> = records
        .iter()
        .filter(|record| record.enrollment_type == enrollment_type)
        .filter(|record| record.faculty_published())
        .filter(|record| normalize_department(&resolved_department(record)) == target)
        .collect();

    let mut to_update = Vec::new();
    let mut skipped = 0;
    for record in &qualifying {
        let marked = record
            .dept_result
            .as_ref()
            .map(|marker| marker.same_department(&department_code))
            .unwrap_or(false);
        if marked {
            skipped += 1;
        } else {
            to_update.push(record.id.clone());
        }
    }

    PublicationPlan {
        department: department_name.trim().to_string(),
        enrollment_type,
        marker: PublicationMarker {
            department_code,
            published_at,
        },
        ranked: rank_candidates(qualifying, config),
        to_update,
        skipped,
    }
}
