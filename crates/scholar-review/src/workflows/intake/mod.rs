//! CSV intake for application spreadsheets and examination result sheets.

mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::scholar::domain::{
    ApplicationSubmission, ExaminationSubmission, MarkParseError,
};

#[derive(Debug)]
pub enum IntakeImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Mark { line: usize, source: MarkParseError },
}

impl std::fmt::Display for IntakeImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeImportError::Io(err) => write!(f, "failed to read intake sheet: {}", err),
            IntakeImportError::Csv(err) => write!(f, "invalid intake CSV data: {}", err),
            IntakeImportError::Mark { line, source } => {
                write!(f, "invalid mark on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for IntakeImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeImportError::Io(err) => Some(err),
            IntakeImportError::Csv(err) => Some(err),
            IntakeImportError::Mark { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for IntakeImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct ScholarIntakeImporter;

impl ScholarIntakeImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ApplicationSubmission>, IntakeImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows become submissions untouched by classification; the service classifies on intake.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicationSubmission>, IntakeImportError> {
        parser::parse_applications(reader)
    }

    pub fn examinations_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ExaminationSubmission>, IntakeImportError> {
        let file = std::fs::File::open(path)?;
        Self::examinations_from_reader(file)
    }

    pub fn examinations_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<ExaminationSubmission>, IntakeImportError> {
        parser::parse_examinations(reader)
    }
}
