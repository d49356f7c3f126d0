//! Input record, slot and output row definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One student-course registration
///
/// Missing fields deserialize to empty strings; such records are skipped by
/// the enrollment index rather than failing the whole bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentRecord {
    pub student_id: String,
    pub course_id: String,
}

impl EnrollmentRecord {
    pub fn new(student_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
        }
    }
}

/// Course metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseRecord {
    /// Unique course code
    pub course_id: String,
    /// Course title
    pub title: String,
    /// Owning program (passthrough)
    pub program: String,
    /// Owning school (passthrough)
    pub school: Option<String>,
}

impl CourseRecord {
    pub fn new(
        course_id: impl Into<String>,
        title: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            title: title.into(),
            program: program.into(),
            school: None,
        }
    }
}

/// Examination room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomRecord {
    /// Room number, unique within its block
    pub room_id: String,
    /// Building or block the room belongs to
    pub block: Option<String>,
    /// Number of seats
    pub seating_capacity: u32,
}

impl RoomRecord {
    pub fn new(room_id: impl Into<String>, seating_capacity: u32) -> Self {
        Self {
            room_id: room_id.into(),
            block: None,
            seating_capacity,
        }
    }

    /// Label used in seat and invigilator rows: `block-room` when a block is set
    pub fn location(&self) -> String {
        match self.block.as_deref().map(str::trim) {
            Some(block) if !block.is_empty() => format!("{}-{}", block, self.room_id.trim()),
            _ => self.room_id.trim().to_string(),
        }
    }
}

/// Staff member available for invigilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffRecord {
    pub staff_id: String,
    pub name: String,
    pub department: String,
    /// Maximum number of room assignments across one run
    pub total_slots_quota: u32,
}

impl StaffRecord {
    pub fn new(
        staff_id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        total_slots_quota: u32,
    ) -> Self {
        Self {
            staff_id: staff_id.into(),
            name: name.into(),
            department: department.into(),
            total_slots_quota,
        }
    }
}

/// Everything a pipeline run consumes besides settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanInputs {
    pub enrollments: Vec<EnrollmentRecord>,
    pub courses: Vec<CourseRecord>,
    /// Fill order is the order given here
    pub rooms: Vec<RoomRecord>,
    /// Round-robin order is the order given here
    pub staff: Vec<StaffRecord>,
}

/// Position of a slot in the timetable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    /// Zero-based slot index
    pub index: usize,
    /// One-based day number
    pub day: u32,
    /// One-based slot number within the day
    pub slot_in_day: u32,
}

impl SlotKey {
    /// Map a slot index onto its day and slot-in-day.
    ///
    /// `slots_per_day` must be non-zero; settings validation guarantees it.
    pub fn new(index: usize, slots_per_day: u32) -> Self {
        let per_day = slots_per_day as usize;
        Self {
            index,
            day: (index / per_day + 1) as u32,
            slot_in_day: (index % per_day + 1) as u32,
        }
    }

    pub fn day_label(&self) -> String {
        format!("Day {}", self.day)
    }

    pub fn slot_label(&self) -> String {
        format!("Slot {}", self.slot_in_day)
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {} Slot {}", self.day, self.slot_in_day)
    }
}

/// One scheduled course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableRow {
    pub day: String,
    pub slot: String,
    pub course_id: String,
    pub title: String,
    pub program: String,
    pub school: Option<String>,
    pub student_count: u32,
}

/// One seated student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRow {
    pub day: String,
    pub slot: String,
    pub room_id: String,
    pub student_id: String,
    pub seat_number: u32,
    pub course_id: String,
}

/// One invigilated room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvigilatorRow {
    pub day: String,
    pub slot: String,
    pub room_id: String,
    pub staff_id: String,
    pub staff_name: String,
    pub staff_dept: String,
}

/// Identity of one invocation, kept outside the deterministic output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
        }
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_key_mapping() {
        let first = SlotKey::new(0, 2);
        assert_eq!((first.day, first.slot_in_day), (1, 1));

        let second = SlotKey::new(1, 2);
        assert_eq!((second.day, second.slot_in_day), (1, 2));

        let third = SlotKey::new(2, 2);
        assert_eq!((third.day, third.slot_in_day), (2, 1));
        assert_eq!(third.day_label(), "Day 2");
        assert_eq!(third.slot_label(), "Slot 1");
        assert_eq!(third.to_string(), "Day 2 Slot 1");
    }

    #[test]
    fn test_slot_key_single_slot_per_day() {
        let key = SlotKey::new(4, 1);
        assert_eq!((key.day, key.slot_in_day), (5, 1));
    }

    #[test]
    fn test_room_location() {
        let mut room = RoomRecord::new("101", 40);
        assert_eq!(room.location(), "101");

        room.block = Some("A".to_string());
        assert_eq!(room.location(), "A-101");

        room.block = Some("  ".to_string());
        assert_eq!(room.location(), "101");
    }

    #[test]
    fn test_inputs_parse_with_missing_fields() {
        let json = r#"{
            "enrollments": [{"student_id": "S1", "course_id": "C1"}, {"student_id": "S2"}],
            "courses": [{"course_id": "C1", "title": "Calculus", "program": "BSc"}],
            "rooms": [{"room_id": "101", "block": "A", "seating_capacity": 30}],
            "staff": [{"staff_id": "T1", "name": "Ada", "department": "Math", "total_slots_quota": 3}]
        }"#;
        let inputs: PlanInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.enrollments.len(), 2);
        assert_eq!(inputs.enrollments[1].course_id, "");
        assert_eq!(inputs.courses[0].school, None);
        assert_eq!(inputs.rooms[0].location(), "A-101");
        assert_eq!(inputs.staff[0].total_slots_quota, 3);
    }

    #[test]
    fn test_run_metadata_unique() {
        let a = RunMetadata::new();
        let b = RunMetadata::new();
        assert_ne!(a.run_id, b.run_id);
    }
}
