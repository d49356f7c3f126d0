//! Non-fatal conditions surfaced next to pipeline output

use serde::{Deserialize, Serialize};

use crate::SlotKey;

/// Kind of input record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Enrollment,
    Course,
    Room,
    Staff,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Enrollment => write!(f, "enrollment"),
            RecordKind::Course => write!(f, "course"),
            RecordKind::Room => write!(f, "room"),
            RecordKind::Staff => write!(f, "staff"),
        }
    }
}

/// A malformed or duplicate record that was left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// Zero-based position in the input sequence
    pub position: usize,
    pub reason: String,
}

/// A course whose enrollment alone exceeds `students_per_slot`.
///
/// Such a course is still placed, alone, in a fresh slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OversizedCourse {
    pub course_id: String,
    pub student_count: u32,
    pub students_per_slot: u32,
    pub slot: SlotKey,
}

/// A student left without a seat because the rooms ran out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnseatedStudent {
    pub slot: SlotKey,
    pub student_id: String,
    pub course_id: String,
}

/// An occupied room no eligible staff member could cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledRoom {
    pub slot: SlotKey,
    pub room_id: String,
}

/// Accumulated diagnostics of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub skipped_records: Vec<SkippedRecord>,
    /// Blacklisted courses that had enrollments
    pub blacklisted_courses: Vec<String>,
    pub oversized_courses: Vec<OversizedCourse>,
    pub unseated_students: Vec<UnseatedStudent>,
    pub unfilled_rooms: Vec<UnfilledRoom>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(&mut self, kind: RecordKind, position: usize, reason: impl Into<String>) {
        self.skipped_records.push(SkippedRecord {
            kind,
            position,
            reason: reason.into(),
        });
    }

    /// True when no capacity problem occurred. Skipped records and the
    /// blacklist report do not count.
    pub fn is_satisfied(&self) -> bool {
        self.oversized_courses.is_empty()
            && self.unseated_students.is_empty()
            && self.unfilled_rooms.is_empty()
    }

    pub fn oversized_course_count(&self) -> usize {
        self.oversized_courses.len()
    }

    pub fn unseated_student_count(&self) -> usize {
        self.unseated_students.len()
    }

    pub fn unfilled_room_count(&self) -> usize {
        self.unfilled_rooms.len()
    }

    pub fn skipped_count(&self, kind: RecordKind) -> usize {
        self.skipped_records
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_diagnostics_satisfied() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_satisfied());
        assert_eq!(diagnostics.unseated_student_count(), 0);
    }

    #[test]
    fn test_skipped_records_do_not_affect_satisfaction() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.skip(RecordKind::Enrollment, 3, "missing course_id");
        diagnostics.skip(RecordKind::Room, 0, "zero seating capacity");

        assert!(diagnostics.is_satisfied());
        assert_eq!(diagnostics.skipped_count(RecordKind::Enrollment), 1);
        assert_eq!(diagnostics.skipped_count(RecordKind::Staff), 0);
    }

    #[test]
    fn test_unfilled_room_breaks_satisfaction() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.unfilled_rooms.push(UnfilledRoom {
            slot: SlotKey::new(0, 2),
            room_id: "101".to_string(),
        });

        assert!(!diagnostics.is_satisfied());
        assert_eq!(diagnostics.unfilled_room_count(), 1);
    }
}
