use serde::{Deserialize, Serialize};

use super::super::domain::{
    EnrollmentType, FACULTY_ENGINEERING, FACULTY_LAW, FACULTY_MANAGEMENT, FACULTY_MEDICINE,
    FACULTY_SCIENCE,
};

pub const STANDARD_RULES_VERSION: u32 = 1;

/// Lower-cased text plus its alphanumeric token stream.
#[derive(Debug, Clone)]
pub(crate) struct ScanText {
    lowered: String,
    tokens: Vec<String>,
}

impl ScanText {
    pub(crate) fn new(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let tokens = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        Self { lowered, tokens }
    }

    fn contains_sequence(&self, sequence: &[String]) -> bool {
        if sequence.is_empty() || sequence.len() > self.tokens.len() {
            return false;
        }
        self.tokens
            .windows(sequence.len())
            .any(|window| window.iter().zip(sequence).all(|(a, b)| a == b))
    }
}

/// How a rule inspects the scanned text. Patterns are expected in lower case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "patterns", rename_all = "snake_case")]
pub enum TextMatcher {
    /// Contiguous run of whole tokens, so `ft` never fires inside `software`.
    Sequence(Vec<String>),
    AnyWord(Vec<String>),
    AnySubstring(Vec<String>),
    AllSubstrings(Vec<String>),
}

impl TextMatcher {
    pub(crate) fn matches(&self, text: &ScanText) -> bool {
        match self {
            Self::Sequence(sequence) => text.contains_sequence(sequence),
            Self::AnyWord(words) => words
                .iter()
                .any(|word| text.tokens.iter().any(|token| token == word)),
            Self::AnySubstring(needles) => needles
                .iter()
                .any(|needle| !needle.is_empty() && text.lowered.contains(needle.as_str())),
            Self::AllSubstrings(needles) => {
                !needles.is_empty()
                    && needles
                        .iter()
                        .all(|needle| text.lowered.contains(needle.as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRule {
    pub matcher: TextMatcher,
    pub enrollment_type: EnrollmentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRule {
    pub matcher: TextMatcher,
    pub faculty: String,
}

/// Ordered rule tables driving the classifier. First matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    pub version: u32,
    pub enrollment: Vec<EnrollmentRule>,
    pub faculty: Vec<FacultyRule>,
    pub institution: Vec<FacultyRule>,
}

impl ClassifierRules {
    pub fn standard() -> Self {
        Self {
            version: STANDARD_RULES_VERSION,
            enrollment: standard_enrollment_rules(),
            faculty: standard_faculty_rules(),
            institution: standard_institution_rules(),
        }
    }

    pub fn enrollment_for(&self, program_text: &str) -> EnrollmentType {
        let text = ScanText::new(program_text);
        self.enrollment_for_scan(&text)
    }

    pub(crate) fn enrollment_for_scan(&self, text: &ScanText) -> EnrollmentType {
        self.enrollment
            .iter()
            .find(|rule| rule.matcher.matches(text))
            .map(|rule| rule.enrollment_type)
            .unwrap_or(EnrollmentType::FullTime)
    }

    /// First program-text faculty rule that fires, exposed so rule order can be asserted.
    pub fn first_faculty_match(&self, program_text: &str) -> Option<&FacultyRule> {
        let text = ScanText::new(program_text);
        first_match(&self.faculty, &text)
    }

    pub fn first_institution_match(&self, institution_text: &str) -> Option<&FacultyRule> {
        let text = ScanText::new(institution_text);
        first_match(&self.institution, &text)
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::standard()
    }
}

fn first_match<'a>(rules: &'a [FacultyRule], text: &ScanText) -> Option<&'a FacultyRule> {
    rules.iter().find(|rule| rule.matcher.matches(text))
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn enrollment(matcher: TextMatcher, enrollment_type: EnrollmentType) -> EnrollmentRule {
    EnrollmentRule {
        matcher,
        enrollment_type,
    }
}

fn faculty(matcher: TextMatcher, faculty: &str) -> FacultyRule {
    FacultyRule {
        matcher,
        faculty: faculty.to_string(),
    }
}

fn standard_enrollment_rules() -> Vec<EnrollmentRule> {
    use EnrollmentType::*;
    use TextMatcher::*;

    vec![
        // department-authored abbreviations
        enrollment(Sequence(words(&["pte", "industry"])), PartTimeExternalIndustry),
        enrollment(Sequence(words(&["pte"])), PartTimeExternal),
        enrollment(Sequence(words(&["pti"])), PartTimeInternal),
        enrollment(Sequence(words(&["ft"])), FullTime),
        enrollment(Sequence(words(&["pt"])), PartTimeInternal),
        // free-text fallbacks
        enrollment(
            AllSubstrings(words(&["part time", "industry"])),
            PartTimeExternalIndustry,
        ),
        enrollment(AllSubstrings(words(&["part time", "external"])), PartTimeExternal),
        enrollment(AnySubstring(words(&["part time", "part-time"])), PartTimeInternal),
        enrollment(AnySubstring(words(&["full time", "full-time"])), FullTime),
    ]
}

fn standard_faculty_rules() -> Vec<FacultyRule> {
    use TextMatcher::*;

    vec![
        faculty(Sequence(words(&["e", "and", "t"])), FACULTY_ENGINEERING),
        faculty(Sequence(words(&["s", "and", "h"])), FACULTY_SCIENCE),
        faculty(Sequence(words(&["hs"])), FACULTY_MEDICINE),
        faculty(Sequence(words(&["mgt"])), FACULTY_MANAGEMENT),
        faculty(
            AnySubstring(words(&["chemistry", "physics", "mathematics", "english"])),
            FACULTY_SCIENCE,
        ),
        // medical before engineering: "Medical Imaging Technology" is a health programme
        faculty(
            AnySubstring(words(&[
                "medical",
                "medicine",
                "health",
                "nursing",
                "pharma",
                "dental",
                "physiotherapy",
                "occupational therapy",
                "clinical",
                "anatomy",
                "physiology",
                "pathology",
                "allied",
            ])),
            FACULTY_MEDICINE,
        ),
        faculty(
            AnySubstring(words(&[
                "management",
                "business",
                "commerce",
                "finance",
                "administration",
                "marketing",
            ])),
            FACULTY_MANAGEMENT,
        ),
        faculty(
            AnySubstring(words(&[
                "engineering",
                "technology",
                "computer",
                "electronics",
                "electrical",
                "mechanical",
                "civil",
                "software",
                "information",
                "robotics",
                "automobile",
                "aerospace",
                "architecture",
                "mechatronics",
            ])),
            FACULTY_ENGINEERING,
        ),
        faculty(
            AnySubstring(words(&[
                "science",
                "humanities",
                "arts",
                "biology",
                "botany",
                "zoology",
                "statistics",
                "psychology",
                "journalism",
                "economics",
                "history",
                "tamil",
                "hindi",
                "french",
                "visual communication",
            ])),
            FACULTY_SCIENCE,
        ),
        faculty(
            AnyWord(words(&["law", "laws", "legal", "jurisprudence"])),
            FACULTY_LAW,
        ),
    ]
}

fn standard_institution_rules() -> Vec<FacultyRule> {
    use TextMatcher::*;

    vec![
        faculty(
            AnySubstring(words(&[
                "medical", "dental", "nursing", "pharmacy", "hospital", "health",
            ])),
            FACULTY_MEDICINE,
        ),
        faculty(
            AnySubstring(words(&["management", "business"])),
            FACULTY_MANAGEMENT,
        ),
        faculty(AnyWord(words(&["law", "legal"])), FACULTY_LAW),
        faculty(AnySubstring(words(&["engineering"])), FACULTY_ENGINEERING),
        faculty(AnySubstring(words(&["science", "arts"])), FACULTY_SCIENCE),
    ]
}
