//! Plan quality figures.
//!
//! | Figure | Definition |
//! |--------|-----------|
//! | Days | Highest day number used |
//! | Slots | Number of non-empty slots |
//! | Rooms used | Occupied (slot, room) pairs |
//! | Seat utilisation | Seated students / seats of occupied rooms |

use serde::Serialize;

use crate::pipeline::AllocationPlan;

/// Headline figures of an allocation plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub days: u32,
    pub slots: usize,
    pub scheduled_courses: usize,
    pub seated_students: usize,
    pub rooms_used: usize,
    pub invigilators_assigned: usize,
    /// 0.0..=1.0, 0.0 when no room is occupied
    pub seat_utilization: f64,
}

impl PlanSummary {
    pub fn calculate(plan: &AllocationPlan) -> Self {
        let timetable = plan.timetable();
        let days = timetable
            .slots()
            .iter()
            .map(|s| s.key.day)
            .max()
            .unwrap_or(0);

        let (seated_students, rooms_used, seats_offered) = match plan.seating() {
            Some(seating) => (
                seating.seated_count(),
                seating.occupancy().len(),
                seating
                    .occupancy()
                    .iter()
                    .map(|o| u64::from(o.capacity))
                    .sum::<u64>(),
            ),
            None => (0, 0, 0),
        };

        let seat_utilization = if seats_offered == 0 {
            0.0
        } else {
            seated_students as f64 / seats_offered as f64
        };

        Self {
            days,
            slots: timetable.slots().len(),
            scheduled_courses: timetable.course_count(),
            seated_students,
            rooms_used,
            invigilators_assigned: plan
                .invigilation()
                .map(|i| i.assignments().len())
                .unwrap_or(0),
            seat_utilization,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::Planner;
    use examplan_core::{
        CourseRecord, EnrollmentRecord, PlanInputs, RoomRecord, Settings, StaffRecord,
    };

    #[test]
    fn test_summary_counts() {
        let mut inputs = PlanInputs::default();
        inputs.courses.push(CourseRecord::new("C1", "One", "BSc"));
        inputs.courses.push(CourseRecord::new("C2", "Two", "BSc"));
        inputs.courses.push(CourseRecord::new("C3", "Three", "BSc"));
        for (student, course) in [("S1", "C1"), ("S1", "C2"), ("S1", "C3"), ("S2", "C1")] {
            inputs.enrollments.push(EnrollmentRecord::new(student, course));
        }
        inputs.rooms.push(RoomRecord::new("R1", 4));
        inputs.staff.push(StaffRecord::new("T1", "Ada", "Math", 5));

        let plan = Planner::new(Settings::default()).unwrap().run(&inputs).unwrap();
        let summary = plan.summary();

        assert_eq!(summary.slots, 3);
        assert_eq!(summary.days, 2);
        assert_eq!(summary.scheduled_courses, 3);
        assert_eq!(summary.seated_students, 4);
        assert_eq!(summary.rooms_used, 3);
        assert_eq!(summary.invigilators_assigned, 3);
        assert!((summary.seat_utilization - 4.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_without_seating() {
        let plan = Planner::new(Settings::default())
            .unwrap()
            .timetable(&PlanInputs::default())
            .unwrap();
        let summary = plan.summary();

        assert_eq!(summary.days, 0);
        assert_eq!(summary.rooms_used, 0);
        assert_eq!(summary.seat_utilization, 0.0);
    }
}
