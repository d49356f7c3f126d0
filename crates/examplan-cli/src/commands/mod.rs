//! CLI commands implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use examplan_core::{Diagnostics, ExamplanError, PlanInputs, RunMetadata};
use examplan_scheduler::{AllocationPlan, PlanOutput, PlanSummary, Planner, Stage};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables
    Table,
    /// JSON document with run metadata
    Json,
}

/// JSON document written for one run
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub kind: &'static str,
    #[serde(flatten)]
    pub output: &'a PlanOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PlanSummary>,
}

/// Read a record bundle, picking the format from the file extension
pub fn load_inputs(path: &Path) -> Result<PlanInputs> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input bundle {}", path.display()))?;

    let inputs: PlanInputs = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            ExamplanError::Input(format!("Failed to parse {}: {}", path.display(), e))
        })?,
        Some("toml") => toml::from_str(&content).map_err(|e| {
            ExamplanError::Input(format!("Failed to parse {}: {}", path.display(), e))
        })?,
        _ => {
            return Err(ExamplanError::Input(format!(
                "Unsupported input format for {} (expected .json or .toml)",
                path.display()
            ))
            .into())
        }
    };

    Ok(inputs)
}

fn report_kind(stage: Stage) -> &'static str {
    match stage {
        Stage::EnrollmentIndex | Stage::Timetable => "timetable",
        Stage::Seating => "seating",
        Stage::Invigilation => "invigilators",
    }
}

/// Run the pipeline through `stage` and print that stage's rows
pub fn generate(
    planner: &Planner,
    input: &Path,
    stage: Stage,
    format: OutputFormat,
    metadata: &RunMetadata,
) -> Result<()> {
    let inputs = load_inputs(input)?;
    let plan = planner.run_stages(&inputs, stage, None)?;
    info!(stage = %stage, "Generated");

    match format {
        OutputFormat::Json => print_json(&plan, report_kind(stage), false, metadata)?,
        OutputFormat::Table => {
            match stage {
                Stage::EnrollmentIndex | Stage::Timetable => print_timetable(&plan),
                Stage::Seating => print_seating(&plan),
                Stage::Invigilation => print_invigilators(&plan),
            }
            print_diagnostics(plan.diagnostics());
        }
    }

    Ok(())
}

/// Run every stage and print all rows, diagnostics and the summary
pub fn plan(
    planner: &Planner,
    input: &Path,
    format: OutputFormat,
    metadata: &RunMetadata,
) -> Result<()> {
    let inputs = load_inputs(input)?;
    let plan = planner.run(&inputs)?;

    match format {
        OutputFormat::Json => print_json(&plan, "plan", true, metadata)?,
        OutputFormat::Table => {
            print_timetable(&plan);
            println!();
            print_seating(&plan);
            println!();
            print_invigilators(&plan);
            print_diagnostics(plan.diagnostics());
            println!();
            print_summary(&plan.summary());
        }
    }

    Ok(())
}

/// Validate settings; with a bundle, also verify the resulting plan
pub fn check(planner: &Planner, input: Option<&Path>) -> Result<()> {
    let settings = planner.settings();
    println!(
        "Settings OK: {} slots/day, {} exams/slot, {} students/slot, {} blacklisted, {} invigilators",
        settings.slots_per_day,
        settings.exams_per_slot,
        settings.students_per_slot,
        settings.blacklist_courses.len(),
        settings.invigilator_strategy
    );

    let Some(input) = input else {
        return Ok(());
    };

    let inputs = load_inputs(input)?;
    let plan = planner.run(&inputs)?;
    let violations = plan.verify();
    print_diagnostics(plan.diagnostics());

    if violations.is_empty() {
        println!("Plan OK: all invariants hold");
        return Ok(());
    }

    for violation in &violations {
        eprintln!("  [{:?}] {}", violation.kind, violation.message);
    }
    anyhow::bail!("Plan violates {} invariant(s)", violations.len())
}

fn print_json(
    plan: &AllocationPlan,
    kind: &'static str,
    with_summary: bool,
    metadata: &RunMetadata,
) -> Result<()> {
    let output = plan.output();
    let report = Report {
        run_id: metadata.run_id,
        generated_at: metadata.generated_at,
        kind,
        output: &output,
        summary: with_summary.then(|| plan.summary()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_timetable(plan: &AllocationPlan) {
    let rows = plan.timetable_rows();
    if rows.is_empty() {
        println!("No courses scheduled");
        return;
    }

    println!(
        "{:<8} {:<8} {:<12} {:<30} {:<15} {:>8}",
        "DAY", "SLOT", "COURSE", "TITLE", "PROGRAM", "STUDENTS"
    );
    println!("{}", "-".repeat(86));
    for row in rows {
        println!(
            "{:<8} {:<8} {:<12} {:<30} {:<15} {:>8}",
            row.day, row.slot, row.course_id, row.title, row.program, row.student_count
        );
    }
}

fn print_seating(plan: &AllocationPlan) {
    let rows = plan.seat_rows();
    if rows.is_empty() {
        println!("No students seated");
        return;
    }

    println!(
        "{:<8} {:<8} {:<12} {:>6} {:<16} {:<12}",
        "DAY", "SLOT", "ROOM", "SEAT", "STUDENT", "COURSE"
    );
    println!("{}", "-".repeat(67));
    for row in rows {
        println!(
            "{:<8} {:<8} {:<12} {:>6} {:<16} {:<12}",
            row.day, row.slot, row.room_id, row.seat_number, row.student_id, row.course_id
        );
    }
}

fn print_invigilators(plan: &AllocationPlan) {
    let rows = plan.invigilator_rows();
    if rows.is_empty() {
        println!("No invigilators assigned");
        return;
    }

    println!(
        "{:<8} {:<8} {:<12} {:<10} {:<24} {:<15}",
        "DAY", "SLOT", "ROOM", "STAFF", "NAME", "DEPARTMENT"
    );
    println!("{}", "-".repeat(82));
    for row in rows {
        println!(
            "{:<8} {:<8} {:<12} {:<10} {:<24} {:<15}",
            row.day, row.slot, row.room_id, row.staff_id, row.staff_name, row.staff_dept
        );
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_satisfied()
        && diagnostics.skipped_records.is_empty()
        && diagnostics.blacklisted_courses.is_empty()
    {
        return;
    }

    println!("\nDiagnostics:");
    if !diagnostics.skipped_records.is_empty() {
        println!("  Skipped records: {}", diagnostics.skipped_records.len());
        for record in &diagnostics.skipped_records {
            println!("    {} #{}: {}", record.kind, record.position, record.reason);
        }
    }
    if !diagnostics.blacklisted_courses.is_empty() {
        println!(
            "  Blacklisted courses: {}",
            diagnostics.blacklisted_courses.join(", ")
        );
    }
    for course in &diagnostics.oversized_courses {
        println!(
            "  Oversized course {} ({} students, limit {}) placed alone in {}",
            course.course_id, course.student_count, course.students_per_slot, course.slot
        );
    }
    if diagnostics.unseated_student_count() > 0 {
        println!(
            "  Unseated students: {}",
            diagnostics.unseated_student_count()
        );
    }
    for room in &diagnostics.unfilled_rooms {
        println!("  No invigilator for room {} in {}", room.room_id, room.slot);
    }
}

fn print_summary(summary: &PlanSummary) {
    println!("Summary:");
    println!("  Days: {}", summary.days);
    println!("  Slots: {}", summary.slots);
    println!("  Courses scheduled: {}", summary.scheduled_courses);
    println!("  Students seated: {}", summary.seated_students);
    println!("  Rooms used: {}", summary.rooms_used);
    println!("  Invigilators assigned: {}", summary.invigilators_assigned);
    println!(
        "  Seat utilisation: {:.1}%",
        summary.seat_utilization * 100.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML_BUNDLE: &str = r#"
[[enrollments]]
student_id = "S1"
course_id = "C1"

[[enrollments]]
student_id = "S2"
course_id = "C1"

[[courses]]
course_id = "C1"
title = "Calculus"
program = "BSc"

[[rooms]]
room_id = "101"
block = "A"
seating_capacity = 1

[[staff]]
staff_id = "T1"
name = "Ada"
department = "Math"
total_slots_quota = 2
"#;

    fn bundle(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_toml_bundle() {
        let file = bundle(".toml", TOML_BUNDLE);
        let inputs = load_inputs(file.path()).unwrap();

        assert_eq!(inputs.enrollments.len(), 2);
        assert_eq!(inputs.courses[0].title, "Calculus");
        assert_eq!(inputs.rooms[0].location(), "A-101");
        assert_eq!(inputs.staff[0].total_slots_quota, 2);
    }

    #[test]
    fn test_load_json_bundle() {
        let file = bundle(
            ".json",
            r#"{"courses": [{"course_id": "C1", "title": "Calculus", "program": "BSc"}]}"#,
        );
        let inputs = load_inputs(file.path()).unwrap();

        assert_eq!(inputs.courses.len(), 1);
        assert!(inputs.enrollments.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = bundle(".csv", "student_id,course_id\nS1,C1\n");
        assert!(load_inputs(file.path()).is_err());
    }

    #[test]
    fn test_report_serializes_flat() {
        let file = bundle(".toml", TOML_BUNDLE);
        let inputs = load_inputs(file.path()).unwrap();
        let plan = Planner::new(Default::default()).unwrap().run(&inputs).unwrap();
        let output = plan.output();
        let metadata = RunMetadata::new();

        let report = Report {
            run_id: metadata.run_id,
            generated_at: metadata.generated_at,
            kind: "plan",
            output: &output,
            summary: Some(plan.summary()),
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["kind"], "plan");
        assert_eq!(value["timetable"][0]["course_id"], "C1");
        assert_eq!(value["seating"][0]["room_id"], "A-101");
        assert_eq!(value["invigilators"][0]["staff_id"], "T1");
        assert_eq!(value["diagnostics"]["unseated_students"][0]["student_id"], "S2");
        assert_eq!(value["summary"]["seated_students"], 1);
    }

    #[test]
    fn test_check_without_input() {
        let planner = Planner::new(Default::default()).unwrap();
        assert!(check(&planner, None).is_ok());
    }

    #[test]
    fn test_check_with_input() {
        let file = bundle(".toml", TOML_BUNDLE);
        let planner = Planner::new(Default::default()).unwrap();
        assert!(check(&planner, Some(file.path())).is_ok());
    }
}
