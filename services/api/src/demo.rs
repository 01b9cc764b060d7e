use crate::infra::{in_memory_service, InMemoryReviewService};
use clap::Args;
use scholar_review::config::{AppConfig, ReviewConfig};
use scholar_review::error::AppError;
use scholar_review::telemetry;
use scholar_review::workflows::intake::ScholarIntakeImporter;
use scholar_review::workflows::scholar::{
    ApplicationId, BatchTransitionReport, EnrollmentType, GroupingSummary, PublishResult,
    ReviewDecision, TextClassifier, TotalMarks,
};
use std::path::PathBuf;

const DEMO_APPLICATIONS: &str = "Application No,Name,Program,Institution\n\
APP-2025-001,Asha Raman,Ph.d. - Biomedical Engineering (ph.d. - Pti - E And T),\n\
APP-2025-002,Vikram Sundar,Ph.D. - Chemistry (Ph.D. - Ft - S And H),\n\
APP-2025-003,Farah Iqbal,Ph.D. - Medical Imaging Technology (Ph.D. - Pte - Hs),\n\
APP-2025-004,Joseph Dass,Ph.D. - Computer Science and Engineering (Ph.D. - Pte (Industry) - E and T),\n\
APP-2025-005,Meena Pillai,Ph.D. - Yoga (Ph.D. - Ft),\n";

const DEMO_RESULTS: &str = "Application No,Name,Department,Mode,Written,Interview,Result\n\
APP-2025-002,Vikram Sundar,Chemistry,Full Time,40,Ab,Published_To_Faculty\n\
APP-2025-011,Divya Mohan,Chemistry,Full Time,30,20,Published_To_Faculty\n\
APP-2025-012,Karthik Rao,Chemistry,Full Time,Ab,Ab,Published_To_Faculty\n\
APP-2025-013,Naveen Thomas,Chemistry,Full Time,45,40,\n";

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Free-text programme description, e.g. "Ph.D. - Physics (Ph.D. - Ft - S And H)"
    #[arg(long)]
    pub(crate) program: String,
    /// Institution text used when the programme alone does not identify a faculty
    #[arg(long)]
    pub(crate) institution: Option<String>,
    /// Emit JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Application sheet exported from the admissions portal
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Faculty directory JSON file (defaults to the configured or built-in directory)
    #[arg(long)]
    pub(crate) directory: Option<PathBuf>,
    /// Emit the grouping summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Department whose rank list is published at the end of the demo
    #[arg(long, default_value = "Chemistry")]
    pub(crate) department: String,
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let classification =
        TextClassifier::standard().classify(&args.program, args.institution.as_deref());

    if args.json {
        println!("{}", to_pretty_json(&classification));
        return Ok(());
    }

    println!("Programme: {}", args.program.trim());
    println!("- Faculty: {}", display_or_unknown(&classification.faculty_name));
    println!(
        "- Department: {}",
        display_or_unknown(&classification.department_name)
    );
    println!("- Enrollment: {}", classification.enrollment_type.label());
    if classification.is_ambiguous() {
        println!("! Classification is incomplete; the record will need manual review.");
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.directory {
        config.review.directory_path = Some(path);
    }
    telemetry::init(&config.telemetry)?;

    let service = in_memory_service(&config.review)?;
    let submissions = ScholarIntakeImporter::from_path(&args.csv)?;
    let total = submissions.len();
    for submission in submissions {
        service.intake(submission)?;
    }

    let summary = service.grouped()?.summary();
    if args.json {
        println!("{}", to_pretty_json(&summary));
    } else {
        println!("Imported {} applications from {}", total, args.csv.display());
        render_grouping(&summary);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = in_memory_service(&ReviewConfig {
        qualifying_total: 60,
        directory_path: None,
    })?;

    println!("Scholar review demo");
    println!("\n1. Intake and classification");
    let mut ids = Vec::new();
    for submission in ScholarIntakeImporter::from_reader(DEMO_APPLICATIONS.as_bytes())? {
        let record = service.intake(submission)?;
        println!(
            "- {} {} -> {} / {} / {}",
            record.id,
            record.application_no,
            display_or_unknown(&record.faculty_name),
            display_or_unknown(&record.department_name),
            record.enrollment_type.label()
        );
        ids.push(record.id);
    }

    println!("\n2. Grouping");
    render_grouping(&service.grouped()?.summary());

    println!("\n3. Director -> research coordinator -> department");
    render_report(&service.forward_to_coordinator(&ids)?);
    render_report(&service.accept_pickup(&ids)?);
    let first = ids[..1].to_vec();
    render_report(&service.forward_to_department(&first, "Biomedical Engineering")?);
    let second = ids[1..2].to_vec();
    render_report(&service.forward_to_department(&second, "Chemistry")?);
    // Stale repeat of a completed handoff is refused rather than re-applied.
    render_report(&service.accept_pickup(&first)?);

    println!("\n4. Department decisions and return path");
    decide(
        &service,
        &first[0],
        ReviewDecision::Approved {
            remarks: Some("Eligible for interview".to_string()),
        },
    )?;
    decide(
        &service,
        &second[0],
        ReviewDecision::Queried {
            question: "Attach the no-objection certificate".to_string(),
        },
    )?;
    let decided: Vec<ApplicationId> = first.iter().chain(second.iter()).cloned().collect();
    render_report(&service.return_to_coordinator(&decided)?);
    render_report(&service.return_to_director(&decided)?);

    for record in service.verified_scholars()? {
        println!("- verified: {} ({})", record.application_no, record.department_name);
    }
    for record in service.query_bucket()? {
        let view = record.status_view();
        println!(
            "- open query: {} [{}]",
            record.application_no,
            view.legacy.dept_review.unwrap_or_default()
        );
    }

    println!("\n5. Rank publication for {}", args.department);
    for submission in ScholarIntakeImporter::examinations_from_reader(DEMO_RESULTS.as_bytes())? {
        service.record_examination(submission)?;
    }
    let published = publish(&service, &args.department)?;
    render_publication(&published);
    let republished = publish(&service, &args.department)?;
    println!(
        "- republish: already_published={} newly_published={} skipped={}",
        republished.already_published,
        republished.newly_published.len(),
        republished.skipped
    );

    Ok(())
}

fn decide(
    service: &InMemoryReviewService,
    id: &ApplicationId,
    decision: ReviewDecision,
) -> Result<(), AppError> {
    let label = decision.label();
    let record = service.record_decision(id, decision)?;
    println!("- {} {} by {}", record.application_no, label, record.department_name);
    Ok(())
}

fn publish(service: &InMemoryReviewService, department: &str) -> Result<PublishResult, AppError> {
    Ok(service.publish_department(department, EnrollmentType::FullTime)?)
}

fn render_grouping(summary: &GroupingSummary) {
    for faculty in &summary.faculties {
        let populated: Vec<_> = faculty
            .departments
            .iter()
            .filter(|department| department.total > 0)
            .collect();
        if populated.is_empty() {
            continue;
        }
        println!("{}", faculty.faculty);
        for department in populated {
            let counts: Vec<String> = department
                .counts
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(label, count)| format!("{label}: {count}"))
                .collect();
            println!("  - {} ({})", department.department, counts.join(", "));
        }
    }
    println!(
        "Assigned {} | unassigned {} | cross-faculty matches {}",
        summary.assigned,
        summary.unassigned.len(),
        summary.cross_faculty_matches
    );
    for entry in &summary.unassigned {
        println!("  ! {} {}", entry.application_no, entry.reason);
    }
}

fn render_report(report: &BatchTransitionReport) {
    println!(
        "- {}: {} applied, {} refused, {} missing",
        report.transition,
        report.applied.len(),
        report.refused.len(),
        report.missing.len()
    );
    for refusal in &report.refused {
        println!("  ! {refusal}");
    }
}

fn render_publication(result: &PublishResult) {
    println!(
        "- marker {} | {} newly published",
        result.marker,
        result.newly_published.len()
    );
    for candidate in &result.ranked {
        let total = match candidate.total {
            TotalMarks::Score(score) => score.to_string(),
            TotalMarks::Absent => "Absent".to_string(),
        };
        let note = if candidate.partial_absence {
            " (partially absent)"
        } else {
            ""
        };
        println!(
            "  {}. {} {} total {}{}{}",
            candidate.rank,
            candidate.application_no,
            candidate.scholar_name,
            total,
            note,
            if candidate.qualified { " qualified" } else { "" }
        );
    }
}

fn display_or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "(unclassified)"
    } else {
        value
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
}
