use std::io::Read;

use serde::Deserialize;

use super::normalizer::{non_blank, normalize_cell};
use super::IntakeImportError;
use crate::workflows::scholar::domain::{ApplicationSubmission, ExaminationSubmission, Mark};

pub(crate) fn parse_applications<R: Read>(
    reader: R,
) -> Result<Vec<ApplicationSubmission>, IntakeImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for row in csv_reader.deserialize::<ApplicationRow>() {
        let row = row?;
        submissions.push(ApplicationSubmission {
            application_no: normalize_cell(&row.application_no),
            scholar_name: normalize_cell(&row.name),
            program_text: normalize_cell(&row.program),
            institution_text: non_blank(row.institution),
            faculty_name: non_blank(row.faculty),
            department_name: non_blank(row.department),
            enrollment_hint: non_blank(row.mode),
        });
    }

    Ok(submissions)
}

pub(crate) fn parse_examinations<R: Read>(
    reader: R,
) -> Result<Vec<ExaminationSubmission>, IntakeImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut submissions = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        // Quoted cells may span lines, so report where the row starts in the sheet.
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or_default();
        let row: ExaminationRow = record.deserialize(Some(&headers))?;
        let written = parse_mark(&row.written, line)?;
        let interview = parse_mark(&row.interview, line)?;

        submissions.push(ExaminationSubmission {
            application_no: normalize_cell(&row.application_no),
            scholar_name: normalize_cell(&row.name),
            program_text: row.program.map(|p| normalize_cell(&p)).unwrap_or_default(),
            department_name: non_blank(row.department),
            enrollment_hint: non_blank(row.mode),
            written,
            interview,
            result_dir: non_blank(row.result),
        });
    }

    Ok(submissions)
}

fn parse_mark(raw: &str, line: usize) -> Result<Mark, IntakeImportError> {
    normalize_cell(raw)
        .parse()
        .map_err(|source| IntakeImportError::Mark { line, source })
}

#[derive(Debug, Deserialize)]
struct ApplicationRow {
    #[serde(rename = "Application No", alias = "Application Number")]
    application_no: String,
    #[serde(rename = "Name", alias = "Scholar Name")]
    name: String,
    #[serde(rename = "Program", alias = "Programme")]
    program: String,
    #[serde(rename = "Institution", default)]
    institution: Option<String>,
    #[serde(rename = "Faculty", default)]
    faculty: Option<String>,
    #[serde(rename = "Department", default)]
    department: Option<String>,
    #[serde(rename = "Mode", alias = "Enrollment Type", default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExaminationRow {
    #[serde(rename = "Application No", alias = "Application Number")]
    application_no: String,
    #[serde(rename = "Name", alias = "Scholar Name")]
    name: String,
    #[serde(rename = "Program", alias = "Programme", default)]
    program: Option<String>,
    #[serde(rename = "Department", default)]
    department: Option<String>,
    #[serde(rename = "Mode", alias = "Enrollment Type", default)]
    mode: Option<String>,
    #[serde(rename = "Written", alias = "Written Marks")]
    written: String,
    #[serde(rename = "Interview", alias = "Interview Marks")]
    interview: String,
    #[serde(rename = "Result", alias = "Result Dir", default)]
    result: Option<String>,
}
