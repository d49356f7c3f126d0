//! Pipeline driver running the stages in order

use examplan_core::{
    Diagnostics, ExamplanError, ExamplanResult, InvigilatorRow, PlanInputs, SeatRow, Settings,
    TimetableRow,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::enrollment::EnrollmentIndex;
use crate::invigilation::{InvigilationPlan, InvigilatorAssigner, Staff};
use crate::seating::{Room, SeatingAllocator, SeatingPlan};
use crate::summary::PlanSummary;
use crate::timetable::{SlotScheduler, Timetable};
use crate::validation::{verify_plan, Violation};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    EnrollmentIndex,
    Timetable,
    Seating,
    Invigilation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::EnrollmentIndex => write!(f, "enrollment-index"),
            Stage::Timetable => write!(f, "timetable"),
            Stage::Seating => write!(f, "seating"),
            Stage::Invigilation => write!(f, "invigilation"),
        }
    }
}

/// Everything one run derived from its inputs
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    settings: Settings,
    index: EnrollmentIndex,
    timetable: Timetable,
    rooms: Vec<Room>,
    seating: Option<SeatingPlan>,
    roster: Vec<Staff>,
    invigilation: Option<InvigilationPlan>,
    diagnostics: Diagnostics,
}

impl AllocationPlan {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &EnrollmentIndex {
        &self.index
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// Usable rooms; empty when seating did not run
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn seating(&self) -> Option<&SeatingPlan> {
        self.seating.as_ref()
    }

    /// Usable roster; empty when invigilation did not run
    pub fn roster(&self) -> &[Staff] {
        &self.roster
    }

    pub fn invigilation(&self) -> Option<&InvigilationPlan> {
        self.invigilation.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn timetable_rows(&self) -> Vec<TimetableRow> {
        self.timetable.rows(&self.index)
    }

    pub fn seat_rows(&self) -> Vec<SeatRow> {
        self.seating.as_ref().map(SeatingPlan::rows).unwrap_or_default()
    }

    pub fn invigilator_rows(&self) -> Vec<InvigilatorRow> {
        self.invigilation
            .as_ref()
            .map(InvigilationPlan::rows)
            .unwrap_or_default()
    }

    /// Re-check the allocation invariants over the finished plan
    pub fn verify(&self) -> Vec<Violation> {
        verify_plan(self)
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary::calculate(self)
    }

    /// Serializable view of the stages that ran
    pub fn output(&self) -> PlanOutput {
        PlanOutput {
            timetable: self.timetable_rows(),
            seating: self.seating.as_ref().map(SeatingPlan::rows),
            invigilators: self.invigilation.as_ref().map(InvigilationPlan::rows),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Output rows and diagnostics of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOutput {
    pub timetable: Vec<TimetableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating: Option<Vec<SeatRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invigilators: Option<Vec<InvigilatorRow>>,
    pub diagnostics: Diagnostics,
}

/// Runs the allocation pipeline with validated settings.
///
/// A planner holds no per-run state, so one instance can serve any number
/// of runs, including concurrent ones.
#[derive(Debug, Clone)]
pub struct Planner {
    settings: Settings,
}

impl Planner {
    /// Create a planner, refusing settings the scheduler cannot run with
    pub fn new(settings: Settings) -> ExamplanResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Schedule the timetable only
    pub fn timetable(&self, inputs: &PlanInputs) -> ExamplanResult<AllocationPlan> {
        self.run_stages(inputs, Stage::Timetable, None)
    }

    /// Schedule the timetable and seat it
    pub fn seating(&self, inputs: &PlanInputs) -> ExamplanResult<AllocationPlan> {
        self.run_stages(inputs, Stage::Seating, None)
    }

    /// Run every stage
    pub fn run(&self, inputs: &PlanInputs) -> ExamplanResult<AllocationPlan> {
        self.run_stages(inputs, Stage::Invigilation, None)
    }

    /// Run every stage, stopping between stages once `cancel` is set
    pub fn run_with_cancel(
        &self,
        inputs: &PlanInputs,
        cancel: &AtomicBool,
    ) -> ExamplanResult<AllocationPlan> {
        self.run_stages(inputs, Stage::Invigilation, Some(cancel))
    }

    /// Run the stages up to and including `through`.
    ///
    /// Every stage completes before the next one starts; cancellation is
    /// only observed at those boundaries and discards the partial plan.
    pub fn run_stages(
        &self,
        inputs: &PlanInputs,
        through: Stage,
        cancel: Option<&AtomicBool>,
    ) -> ExamplanResult<AllocationPlan> {
        let checkpoint = |completed: Stage| -> ExamplanResult<()> {
            if cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                info!(completed_stage = %completed, "Run cancelled");
                return Err(ExamplanError::Cancelled {
                    completed_stage: completed.to_string(),
                });
            }
            debug!(completed_stage = %completed, "Stage complete");
            Ok(())
        };

        let mut diagnostics = Diagnostics::new();

        let index = EnrollmentIndex::build(&inputs.enrollments, &inputs.courses, &mut diagnostics);
        checkpoint(Stage::EnrollmentIndex)?;

        let timetable = SlotScheduler::new(&index, &self.settings).schedule(&mut diagnostics);

        let mut plan = AllocationPlan {
            settings: self.settings.clone(),
            index,
            timetable,
            rooms: Vec::new(),
            seating: None,
            roster: Vec::new(),
            invigilation: None,
            diagnostics,
        };
        if through <= Stage::Timetable {
            return Ok(plan);
        }
        checkpoint(Stage::Timetable)?;

        plan.rooms = Room::from_records(&inputs.rooms, &mut plan.diagnostics);
        let seating = SeatingAllocator::new(&plan.rooms).allocate(
            &plan.timetable,
            &plan.index,
            &mut plan.diagnostics,
        );
        if through <= Stage::Seating {
            plan.seating = Some(seating);
            return Ok(plan);
        }
        checkpoint(Stage::Seating)?;

        plan.roster = Staff::from_records(&inputs.staff, &mut plan.diagnostics);
        let invigilation = InvigilatorAssigner::new(&plan.roster, self.settings.invigilator_strategy)
            .assign(&seating, &mut plan.diagnostics);
        plan.seating = Some(seating);
        plan.invigilation = Some(invigilation);

        info!(
            slots = plan.timetable.slots().len(),
            oversized = plan.diagnostics.oversized_course_count(),
            unseated = plan.diagnostics.unseated_student_count(),
            unfilled = plan.diagnostics.unfilled_room_count(),
            "Allocation complete"
        );

        Ok(plan)
    }
}
