mod rules;

pub use rules::{ClassifierRules, EnrollmentRule, FacultyRule, TextMatcher, STANDARD_RULES_VERSION};

use super::domain::Classification;
use rules::ScanText;

/// Infers faculty, department, and enrollment type from free-text programme descriptions.
///
/// The classifier never fails: anything it cannot place comes back as an empty string and is
/// left for the grouping stage to report as unassigned.
#[derive(Debug, Clone, Default)]
pub struct TextClassifier {
    rules: ClassifierRules,
}

impl TextClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(ClassifierRules::standard())
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    pub fn classify(&self, program_text: &str, institution_text: Option<&str>) -> Classification {
        let program = ScanText::new(program_text);

        Classification {
            faculty_name: self.faculty_for(&program, institution_text),
            department_name: department_from_program(program_text),
            enrollment_type: self.rules.enrollment_for_scan(&program),
        }
    }

    fn faculty_for(&self, program: &ScanText, institution_text: Option<&str>) -> String {
        if let Some(rule) = self
            .rules
            .faculty
            .iter()
            .find(|rule| rule.matcher.matches(program))
        {
            return rule.faculty.clone();
        }

        institution_text
            .and_then(|text| self.rules.first_institution_match(text))
            .map(|rule| rule.faculty.clone())
            .unwrap_or_default()
    }
}

/// `"Ph.d. - Biomedical Engineering (ph.d. - Pti - E And T)"` -> `"Biomedical Engineering"`.
pub fn department_from_program(program_text: &str) -> String {
    let head = match program_text.find('(') {
        Some(index) => &program_text[..index],
        None => program_text,
    };

    let trimmed = head.trim();
    let remainder = strip_phd_prefix(trimmed).unwrap_or(trimmed);
    remainder.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_phd_prefix(value: &str) -> Option<&str> {
    let lowered = value.to_ascii_lowercase();
    let after_degree = ["ph.d.", "ph.d", "phd"]
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))
        .map(|prefix| value[prefix.len()..].trim_start())?;

    after_degree.strip_prefix('-').map(str::trim_start)
}
