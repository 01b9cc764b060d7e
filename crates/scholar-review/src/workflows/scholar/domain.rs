use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::checklist::ChecklistState;
use super::directory::normalize_department;

pub const FACULTY_ENGINEERING: &str = "Faculty of Engineering & Technology";
pub const FACULTY_SCIENCE: &str = "Faculty of Science & Humanities";
pub const FACULTY_MEDICINE: &str = "Faculty of Medicine & Health Sciences";
pub const FACULTY_MANAGEMENT: &str = "Faculty of Management";
pub const FACULTY_LAW: &str = "Faculty of Law";

/// Short faculty label used in forwarding statuses, e.g. `Engineering` for
/// `Faculty of Engineering & Technology`.
pub fn faculty_short_label(faculty_name: &str) -> String {
    let trimmed = faculty_name.trim();
    let without_prefix = match trimmed.get(..11) {
        Some(prefix) if prefix.eq_ignore_ascii_case("faculty of ") => &trimmed[11..],
        _ => trimmed,
    };
    without_prefix
        .split(" & ")
        .next()
        .unwrap_or(without_prefix)
        .trim()
        .to_string()
}

/// Identifier wrapper for scholar applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for examination records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExaminationId(pub String);

impl fmt::Display for ExaminationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnrollmentType {
    FullTime,
    PartTimeInternal,
    PartTimeExternal,
    PartTimeExternalIndustry,
}

impl EnrollmentType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::FullTime,
            Self::PartTimeInternal,
            Self::PartTimeExternal,
            Self::PartTimeExternalIndustry,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullTime => "Full Time",
            Self::PartTimeInternal => "Part Time Internal",
            Self::PartTimeExternal => "Part Time External",
            Self::PartTimeExternalIndustry => "Part Time External (Industry)",
        }
    }

    /// Buckets a free-form enrollment label. Anything unrecognised is treated as full time.
    pub fn from_label(value: &str) -> Self {
        let lowered = value.to_ascii_lowercase();
        if lowered.contains("full") {
            Self::FullTime
        } else if lowered.contains("internal") {
            Self::PartTimeInternal
        } else if lowered.contains("external") && lowered.contains("industry") {
            Self::PartTimeExternalIndustry
        } else if lowered.contains("external") {
            Self::PartTimeExternal
        } else {
            Self::FullTime
        }
    }
}

/// Actor currently responsible for the next action on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Director,
    ResearchCoordinator,
    Department,
}

impl Owner {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::ResearchCoordinator => "research_coordinator",
            Self::Department => "department",
        }
    }
}

/// Ownership and routing position of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Uploaded,
    AwaitingCoordinatorPickup { faculty_label: String },
    WithCoordinator { faculty_label: String },
    WithDepartment { department_code: String },
    ReturnedToCoordinator { department_code: String },
    ReturnedToDirector { department_code: String },
}

impl WorkflowState {
    pub fn owner(&self) -> Owner {
        match self {
            Self::Uploaded | Self::AwaitingCoordinatorPickup { .. } => Owner::Director,
            Self::WithCoordinator { .. } | Self::ReturnedToCoordinator { .. } => {
                Owner::ResearchCoordinator
            }
            Self::WithDepartment { .. } => Owner::Department,
            Self::ReturnedToDirector { .. } => Owner::Director,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::AwaitingCoordinatorPickup { .. } => "awaiting_coordinator_pickup",
            Self::WithCoordinator { .. } => "with_coordinator",
            Self::WithDepartment { .. } => "with_department",
            Self::ReturnedToCoordinator { .. } => "returned_to_coordinator",
            Self::ReturnedToDirector { .. } => "returned_to_director",
        }
    }

    pub fn department_code(&self) -> Option<&str> {
        match self {
            Self::WithDepartment { department_code }
            | Self::ReturnedToCoordinator { department_code }
            | Self::ReturnedToDirector { department_code } => Some(department_code),
            _ => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ReturnedToDirector { .. })
    }
}

/// Department decision recorded against an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved {
        #[serde(default)]
        remarks: Option<String>,
    },
    Rejected {
        reason: String,
    },
    Queried {
        question: String,
    },
}

impl ReviewDecision {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Approved { .. } => "approved",
            Self::Rejected { .. } => "rejected",
            Self::Queried { .. } => "queried",
        }
    }

    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Queried { .. })
    }

    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Output of the text classifier. Empty strings mean "unclassified".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub faculty_name: String,
    pub department_name: String,
    pub enrollment_type: EnrollmentType,
}

impl Classification {
    pub fn is_ambiguous(&self) -> bool {
        self.faculty_name.is_empty() || self.department_name.is_empty()
    }
}

/// Intake payload, typically one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub application_no: String,
    pub scholar_name: String,
    pub program_text: String,
    #[serde(default)]
    pub institution_text: Option<String>,
    #[serde(default)]
    pub faculty_name: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub enrollment_hint: Option<String>,
}

/// Stored admission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarApplication {
    pub id: ApplicationId,
    pub application_no: String,
    pub scholar_name: String,
    pub program_text: String,
    pub institution_text: String,
    pub faculty_name: String,
    pub department_name: String,
    pub enrollment_type: EnrollmentType,
    pub workflow: WorkflowState,
    pub review: Option<ReviewDecision>,
    pub checklist: ChecklistState,
    pub verification_status: Option<String>,
    pub eligibility_confirmed: bool,
}

impl ScholarApplication {
    pub fn owner(&self) -> Owner {
        self.workflow.owner()
    }
}

/// Department-scoped publication marker stored on examination records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMarker {
    pub department_code: String,
    pub published_at: DateTime<Utc>,
}

impl PublicationMarker {
    /// Uncoded departments carry their name as the code, so spelling differences are ignored.
    pub fn same_department(&self, department_code: &str) -> bool {
        normalize_department(&self.department_code) == normalize_department(department_code)
    }
}

/// One examination component; `Ab` in source sheets means absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    Score(f64),
    Absent,
}

impl Mark {
    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn value_or_zero(self) -> f64 {
        match self {
            Self::Score(value) => value,
            Self::Absent => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is neither a mark nor an absence marker")]
pub struct MarkParseError(pub String);

impl FromStr for Mark {
    type Err = MarkParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("ab") || trimmed.eq_ignore_ascii_case("absent") {
            return Ok(Self::Absent);
        }

        match trimmed.parse::<f64>() {
            Ok(score) if score.is_finite() && score >= 0.0 => Ok(Self::Score(score)),
            _ => Err(MarkParseError(trimmed.to_string())),
        }
    }
}

impl Serialize for Mark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Score(value) => serializer.serialize_f64(*value),
            Self::Absent => serializer.serialize_str("Ab"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMark {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMark::deserialize(deserializer)? {
            RawMark::Number(value) if value.is_finite() && value >= 0.0 => Ok(Self::Score(value)),
            RawMark::Number(value) => Err(serde::de::Error::custom(MarkParseError(
                value.to_string(),
            ))),
            RawMark::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Combined written and interview total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalMarks {
    Score(u32),
    Absent,
}

impl TotalMarks {
    pub fn score(self) -> Option<u32> {
        match self {
            Self::Score(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl Serialize for TotalMarks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Score(value) => serializer.serialize_u32(*value),
            Self::Absent => serializer.serialize_str("Absent"),
        }
    }
}

/// Intake payload for one examination outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExaminationSubmission {
    pub application_no: String,
    pub scholar_name: String,
    #[serde(default)]
    pub program_text: String,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub enrollment_hint: Option<String>,
    pub written: Mark,
    pub interview: Mark,
    #[serde(default)]
    pub result_dir: Option<String>,
}

/// Stored examination outcome, joined to an application by `application_no`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExaminationRecord {
    pub id: ExaminationId,
    pub application_no: String,
    pub scholar_name: String,
    pub program_text: String,
    pub department_name: String,
    pub enrollment_type: EnrollmentType,
    pub written: Mark,
    pub interview: Mark,
    pub result_dir: Option<String>,
    pub dept_result: Option<PublicationMarker>,
}

impl ExaminationRecord {
    /// Faculty-level publication has happened when the result marker mentions `Published`.
    pub fn faculty_published(&self) -> bool {
        self.result_dir
            .as_deref()
            .map(|marker| marker.contains("Published"))
            .unwrap_or(false)
    }
}
