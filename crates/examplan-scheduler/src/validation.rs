//! Invariant checks over a finished allocation plan.
//!
//! Detects:
//! - Courses sharing a student in the same slot
//! - Slots over `students_per_slot` or `exams_per_slot` (flagged oversized
//!   courses placed alone are exempt)
//! - Blacklisted courses on the timetable, schedulable courses missing from it
//! - Seats used twice, seat numbers beyond room capacity, students seated twice
//! - Staff over quota or in two rooms of one slot

use std::collections::{HashMap, HashSet};

use crate::pipeline::AllocationPlan;

/// A broken invariant
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Human-readable description
    pub message: String,
}

/// Categories of broken invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Two courses in one slot share a student
    StudentConflict,
    /// Slot enrollment above `students_per_slot`
    StudentCapacity,
    /// Slot course count above `exams_per_slot`
    ExamCapacity,
    /// A blacklisted course was scheduled
    BlacklistedScheduled,
    /// A schedulable course is missing from the timetable
    Unscheduled,
    /// A (room, seat) pair used twice in one slot
    DuplicateSeat,
    /// A seat number outside 1..=capacity
    SeatOutOfRange,
    /// A student seated twice in one slot
    DuplicateStudent,
    /// A staff member assigned more often than their quota
    QuotaExceeded,
    /// A staff member in two rooms of one slot
    DoubleBooked,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Check every allocation invariant of `plan`.
///
/// # Returns
/// All detected violations; empty when the plan is consistent.
pub fn verify_plan(plan: &AllocationPlan) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_timetable(plan, &mut violations);
    check_seating(plan, &mut violations);
    check_invigilation(plan, &mut violations);
    violations
}

fn check_timetable(plan: &AllocationPlan, violations: &mut Vec<Violation>) {
    let index = plan.index();
    let settings = plan.settings();
    let oversized: HashSet<&str> = plan
        .diagnostics()
        .oversized_courses
        .iter()
        .map(|c| c.course_id.as_str())
        .collect();

    let mut scheduled = HashSet::new();

    for slot in plan.timetable().slots() {
        for (i, &a) in slot.courses.iter().enumerate() {
            scheduled.insert(a);
            for &b in &slot.courses[i + 1..] {
                if index.share_student(a, b) {
                    violations.push(Violation::new(
                        ViolationKind::StudentConflict,
                        format!(
                            "{} and {} share a student in {}",
                            index.course(a).course_id,
                            index.course(b).course_id,
                            slot.key
                        ),
                    ));
                }
            }
        }

        let total: u64 = slot
            .courses
            .iter()
            .map(|&c| u64::from(index.course(c).enrolled_count()))
            .sum();
        let exempt = slot.courses.len() == 1
            && oversized.contains(index.course(slot.courses[0]).course_id.as_str());
        if total > u64::from(settings.students_per_slot) && !exempt {
            violations.push(Violation::new(
                ViolationKind::StudentCapacity,
                format!(
                    "{} holds {} students, limit {}",
                    slot.key, total, settings.students_per_slot
                ),
            ));
        }

        if slot.courses.len() > settings.exams_per_slot as usize {
            violations.push(Violation::new(
                ViolationKind::ExamCapacity,
                format!(
                    "{} holds {} exams, limit {}",
                    slot.key,
                    slot.courses.len(),
                    settings.exams_per_slot
                ),
            ));
        }
    }

    for (idx, course) in index.courses().iter().enumerate() {
        let blacklisted = settings.is_blacklisted(&course.course_id);
        let is_scheduled = scheduled.contains(&idx);
        if blacklisted && is_scheduled {
            violations.push(Violation::new(
                ViolationKind::BlacklistedScheduled,
                format!("Blacklisted course {} is on the timetable", course.course_id),
            ));
        } else if !blacklisted && !is_scheduled && course.enrolled_count() > 0 {
            violations.push(Violation::new(
                ViolationKind::Unscheduled,
                format!("Course {} was not scheduled", course.course_id),
            ));
        }
    }
}

fn check_seating(plan: &AllocationPlan, violations: &mut Vec<Violation>) {
    let Some(seating) = plan.seating() else {
        return;
    };

    let capacities: HashMap<&str, u32> = plan
        .rooms()
        .iter()
        .map(|r| (r.room_id.as_str(), r.capacity))
        .collect();
    let mut seats = HashSet::new();
    let mut students = HashSet::new();

    for seat in seating.assignments() {
        if !seats.insert((seat.slot.index, seat.room_id.as_str(), seat.seat_number)) {
            violations.push(Violation::new(
                ViolationKind::DuplicateSeat,
                format!(
                    "Seat {} in {} used twice in {}",
                    seat.seat_number, seat.room_id, seat.slot
                ),
            ));
        }

        let capacity = capacities.get(seat.room_id.as_str()).copied().unwrap_or(0);
        if seat.seat_number == 0 || seat.seat_number > capacity {
            violations.push(Violation::new(
                ViolationKind::SeatOutOfRange,
                format!(
                    "Seat {} in {} exceeds capacity {}",
                    seat.seat_number, seat.room_id, capacity
                ),
            ));
        }

        if !students.insert((seat.slot.index, seat.student_id.as_str())) {
            violations.push(Violation::new(
                ViolationKind::DuplicateStudent,
                format!("Student {} seated twice in {}", seat.student_id, seat.slot),
            ));
        }
    }
}

fn check_invigilation(plan: &AllocationPlan, violations: &mut Vec<Violation>) {
    let Some(invigilation) = plan.invigilation() else {
        return;
    };

    let quotas: HashMap<&str, u32> = plan
        .roster()
        .iter()
        .map(|s| (s.staff_id.as_str(), s.quota))
        .collect();
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut booked = HashSet::new();

    for assignment in invigilation.assignments() {
        *counts.entry(assignment.staff_id.as_str()).or_insert(0) += 1;

        if !booked.insert((assignment.slot.index, assignment.staff_id.as_str())) {
            violations.push(Violation::new(
                ViolationKind::DoubleBooked,
                format!(
                    "Staff {} covers two rooms in {}",
                    assignment.staff_id, assignment.slot
                ),
            ));
        }
    }

    // Roster order keeps the report deterministic.
    for staff in plan.roster() {
        let used = counts.get(staff.staff_id.as_str()).copied().unwrap_or(0);
        let quota = quotas.get(staff.staff_id.as_str()).copied().unwrap_or(0);
        if used > quota {
            violations.push(Violation::new(
                ViolationKind::QuotaExceeded,
                format!(
                    "Staff {} assigned {} times, quota {}",
                    staff.staff_id, used, quota
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Planner;
    use examplan_core::{
        CourseRecord, EnrollmentRecord, PlanInputs, RoomRecord, Settings, StaffRecord,
    };

    /// Mixed load: shared students, a tight slot limit, too few seats and
    /// too little staff.
    fn stressed_inputs() -> PlanInputs {
        let mut inputs = PlanInputs::default();
        for c in 0..8 {
            inputs
                .courses
                .push(CourseRecord::new(format!("C{}", c), "Exam", "BSc"));
        }
        for s in 0..60 {
            let first = s % 8;
            let second = (s * 3 + 1) % 8;
            inputs
                .enrollments
                .push(EnrollmentRecord::new(format!("S{}", s), format!("C{}", first)));
            inputs
                .enrollments
                .push(EnrollmentRecord::new(format!("S{}", s), format!("C{}", second)));
        }
        inputs.rooms.push(RoomRecord::new("R1", 7));
        inputs.rooms.push(RoomRecord::new("R2", 5));
        inputs.rooms.push(RoomRecord::new("R3", 4));
        inputs.staff.push(StaffRecord::new("T1", "Ada", "Math", 3));
        inputs.staff.push(StaffRecord::new("T2", "Alan", "CS", 2));
        inputs.staff.push(StaffRecord::new("T3", "Grace", "CS", 4));
        inputs
    }

    #[test]
    fn test_invariants_hold_under_pressure() {
        let settings = Settings {
            slots_per_day: 3,
            exams_per_slot: 2,
            students_per_slot: 30,
            ..Settings::default()
        };
        let plan = Planner::new(settings)
            .unwrap()
            .run(&stressed_inputs())
            .unwrap();

        assert!(plan.verify().is_empty(), "{:?}", plan.verify());
        assert!(plan.diagnostics().unseated_student_count() > 0);
        assert!(plan.diagnostics().unfilled_room_count() > 0);
    }

    #[test]
    fn test_oversized_course_is_exempt() {
        let mut inputs = PlanInputs::default();
        inputs.courses.push(CourseRecord::new("BIG", "Big", "BSc"));
        for s in 0..5 {
            inputs
                .enrollments
                .push(EnrollmentRecord::new(format!("S{}", s), "BIG"));
        }
        let settings = Settings {
            students_per_slot: 3,
            ..Settings::default()
        };

        let plan = Planner::new(settings).unwrap().timetable(&inputs).unwrap();

        assert_eq!(plan.diagnostics().oversized_course_count(), 1);
        assert!(plan.verify().is_empty());
    }

    #[test]
    fn test_quota_and_exclusivity_hold_with_zero_quota_staff() {
        let mut inputs = stressed_inputs();
        inputs.staff = vec![
            StaffRecord::new("T1", "Ada", "Math", 0),
            StaffRecord::new("T2", "Alan", "CS", 1),
        ];

        let plan = Planner::new(Settings::default()).unwrap().run(&inputs).unwrap();
        let invigilation = plan.invigilation().unwrap();

        assert!(invigilation.assignments().iter().all(|a| a.staff_id == "T2"));
        assert_eq!(invigilation.assignments().len(), 1);
        assert!(plan.verify().is_empty());
    }
}
