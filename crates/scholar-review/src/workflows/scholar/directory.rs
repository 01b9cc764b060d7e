use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    FACULTY_ENGINEERING, FACULTY_LAW, FACULTY_MANAGEMENT, FACULTY_MEDICINE, FACULTY_SCIENCE,
};

/// Canonical faculty with the departments it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyEntry {
    pub name: String,
    pub departments: Vec<String>,
}

/// Read-only faculty -> department directory supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacultyDirectory {
    pub faculties: Vec<FacultyEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read faculty directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid faculty directory json: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a department hint was reconciled with the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    /// Department found under a different faculty than the hint resolved to.
    CrossFaculty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryMatch {
    pub faculty: String,
    pub department: String,
    pub kind: MatchKind,
}

impl FacultyDirectory {
    pub fn new(faculties: Vec<FacultyEntry>) -> Self {
        Self { faculties }
    }

    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn standard() -> Self {
        fn entry(name: &str, departments: &[&str]) -> FacultyEntry {
            FacultyEntry {
                name: name.to_string(),
                departments: departments.iter().map(|d| d.to_string()).collect(),
            }
        }

        Self::new(vec![
            entry(
                FACULTY_ENGINEERING,
                &[
                    "Biomedical Engineering",
                    "Civil Engineering",
                    "Computer Science and Engineering",
                    "Electrical and Electronics Engineering",
                    "Electronics and Communication Engineering",
                    "Information Technology",
                    "Mechanical Engineering",
                    "Biotechnology",
                ],
            ),
            entry(
                FACULTY_SCIENCE,
                &[
                    "Chemistry",
                    "Physics",
                    "Mathematics",
                    "English",
                    "Computer Science",
                    "Visual Communication",
                ],
            ),
            entry(
                FACULTY_MEDICINE,
                &[
                    "Medical Imaging Technology",
                    "Pharmacy",
                    "Nursing",
                    "Physiotherapy",
                    "Public Health",
                ],
            ),
            entry(FACULTY_MANAGEMENT, &["Management Studies", "Commerce"]),
            entry(FACULTY_LAW, &["Law"]),
        ])
    }

    pub fn faculty_names(&self) -> impl Iterator<Item = &str> {
        self.faculties.iter().map(|faculty| faculty.name.as_str())
    }

    /// Exact canonical name first, then normalised equality or containment either way.
    pub fn resolve_faculty(&self, hint: &str) -> Option<&FacultyEntry> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }

        if let Some(entry) = self.faculties.iter().find(|entry| entry.name == hint) {
            return Some(entry);
        }

        let normalized_hint = normalize_faculty(hint);
        if normalized_hint.is_empty() {
            return None;
        }

        self.faculties.iter().find(|entry| {
            let candidate = normalize_faculty(&entry.name);
            !candidate.is_empty()
                && (candidate == normalized_hint
                    || candidate.contains(&normalized_hint)
                    || normalized_hint.contains(&candidate))
        })
    }

    /// Canonical department name for the hint, or `None` when nothing qualifies.
    pub fn resolve_department(&self, faculty_hint: &str, department_hint: &str) -> Option<String> {
        self.resolve(faculty_hint, department_hint)
            .map(|matched| matched.department)
    }

    /// Directory spelling of a department named under any faculty, compared after
    /// normalisation.
    pub fn canonical_department(&self, department_hint: &str) -> Option<&str> {
        let wanted = normalize_department(department_hint);
        if wanted.is_empty() {
            return None;
        }
        self.faculties
            .iter()
            .flat_map(|entry| entry.departments.iter())
            .find(|department| normalize_department(department) == wanted)
            .map(String::as_str)
    }

    /// Full resolution including the faculty the department was attached to.
    ///
    /// When the hinted faculty has no such department, every faculty is scanned for an exact
    /// department name and the record is attached there. Such matches are reported as
    /// [`MatchKind::CrossFaculty`] and logged so the directory data can be cleaned up.
    pub fn resolve(&self, faculty_hint: &str, department_hint: &str) -> Option<DirectoryMatch> {
        let department_hint = department_hint.trim();
        if department_hint.is_empty() {
            return None;
        }

        let faculty = self.resolve_faculty(faculty_hint);
        if let Some(entry) = faculty {
            if let Some((department, kind)) = match_department(entry, department_hint) {
                return Some(DirectoryMatch {
                    faculty: entry.name.clone(),
                    department,
                    kind,
                });
            }
        }

        let fallback = self.faculties.iter().find_map(|entry| {
            entry
                .departments
                .iter()
                .find(|department| department.eq_ignore_ascii_case(department_hint))
                .map(|department| (entry, department))
        })?;

        let (entry, department) = fallback;
        warn!(
            faculty_hint,
            resolved_faculty = faculty.map(|entry| entry.name.as_str()).unwrap_or(""),
            matched_faculty = %entry.name,
            department = %department,
            "department attached through cross-faculty fallback"
        );

        Some(DirectoryMatch {
            faculty: entry.name.clone(),
            department: department.clone(),
            kind: MatchKind::CrossFaculty,
        })
    }
}

fn match_department(entry: &FacultyEntry, hint: &str) -> Option<(String, MatchKind)> {
    if let Some(exact) = entry
        .departments
        .iter()
        .find(|department| department.eq_ignore_ascii_case(hint))
    {
        return Some((exact.clone(), MatchKind::Exact));
    }

    let normalized_hint = normalize_department(hint);
    if normalized_hint.is_empty() {
        return None;
    }

    entry
        .departments
        .iter()
        .find(|department| {
            let candidate = normalize_department(department);
            !candidate.is_empty()
                && (candidate.contains(&normalized_hint) || normalized_hint.contains(&candidate))
        })
        .map(|department| (department.clone(), MatchKind::Fuzzy))
}

/// Lower-case, drop `faculty of`, `&` and `and`, collapse whitespace.
pub fn normalize_faculty(value: &str) -> String {
    let lowered = value.to_lowercase().replace("faculty of", " ");
    strip_conjunctions(&lowered)
}

pub fn normalize_department(value: &str) -> String {
    strip_conjunctions(&value.to_lowercase())
}

fn strip_conjunctions(lowered: &str) -> String {
    lowered
        .replace('&', " ")
        .split_whitespace()
        .filter(|word| *word != "and")
        .collect::<Vec<_>>()
        .join(" ")
}

static DEPARTMENT_CODES: OnceLock<HashMap<String, &'static str>> = OnceLock::new();

/// Short code used in forwarding statuses and publication markers. Departments without a
/// registered code use their full name.
pub fn department_short_code(department_name: &str) -> String {
    let key = normalize_department(department_name);
    department_codes()
        .get(&key)
        .map(|code| code.to_string())
        .unwrap_or_else(|| department_name.trim().to_string())
}

fn department_codes() -> &'static HashMap<String, &'static str> {
    DEPARTMENT_CODES.get_or_init(|| {
        const NAME_TO_CODE: &[(&str, &str)] = &[
            // Engineering & Technology
            ("Biomedical Engineering", "BME"),
            ("Civil Engineering", "CIVIL"),
            ("Computer Science and Engineering", "CSE"),
            ("Computer Science & Engineering", "CSE"),
            ("Electrical and Electronics Engineering", "EEE"),
            ("Electronics and Communication Engineering", "ECE"),
            ("Information Technology", "IT"),
            ("Mechanical Engineering", "MECH"),
            ("Biotechnology", "BIOTECH"),
            // Science & Humanities
            ("Chemistry", "CHEM"),
            ("Physics", "PHY"),
            ("Mathematics", "MATHS"),
            ("English", "ENG"),
            ("Computer Science", "CS"),
            ("Visual Communication", "VISCOM"),
            // Medicine & Health Sciences
            ("Medical Imaging Technology", "MIT"),
            ("Pharmacy", "PHARM"),
            ("Physiotherapy", "PHYSIO"),
            // Management
            ("Management Studies", "MBA"),
            ("Commerce", "COM"),
        ];

        NAME_TO_CODE
            .iter()
            .map(|(name, code)| (normalize_department(name), *code))
            .collect()
    })
}

#[cfg(test)]
pub(crate) fn lookup_code_for_tests(department_name: &str) -> Option<&'static str> {
    department_codes()
        .get(&normalize_department(department_name))
        .copied()
}
