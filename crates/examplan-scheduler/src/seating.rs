//! First-fit seating of each slot's students into rooms

use examplan_core::{Diagnostics, RecordKind, RoomRecord, SeatRow, SlotKey, UnseatedStudent};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::enrollment::EnrollmentIndex;
use crate::timetable::{Slot, Timetable};

/// A usable examination room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Location label, unique across the inventory
    pub room_id: String,
    pub capacity: u32,
}

impl Room {
    /// Turn room records into usable rooms, keeping input order.
    ///
    /// Records with a blank id, zero capacity or a repeated location are
    /// skipped and reported.
    pub fn from_records(records: &[RoomRecord], diagnostics: &mut Diagnostics) -> Vec<Room> {
        let mut seen = HashSet::new();
        let mut rooms = Vec::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            if record.room_id.trim().is_empty() {
                warn!(position, "Skipping room record without room_id");
                diagnostics.skip(RecordKind::Room, position, "missing room_id");
                continue;
            }

            let room_id = record.location();
            if record.seating_capacity == 0 {
                warn!(position, room = %room_id, "Skipping room with zero capacity");
                diagnostics.skip(RecordKind::Room, position, "zero seating capacity");
                continue;
            }
            if !seen.insert(room_id.clone()) {
                warn!(position, room = %room_id, "Skipping duplicate room record");
                diagnostics.skip(
                    RecordKind::Room,
                    position,
                    format!("duplicate room {}", room_id),
                );
                continue;
            }

            rooms.push(Room {
                room_id,
                capacity: record.seating_capacity,
            });
        }

        rooms
    }
}

/// One seated student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatAssignment {
    pub slot: SlotKey,
    pub room_id: String,
    /// One-based seat number within the room
    pub seat_number: u32,
    pub student_id: String,
    pub course_id: String,
}

impl SeatAssignment {
    pub fn to_row(&self) -> SeatRow {
        SeatRow {
            day: self.slot.day_label(),
            slot: self.slot.slot_label(),
            room_id: self.room_id.clone(),
            student_id: self.student_id.clone(),
            seat_number: self.seat_number,
            course_id: self.course_id.clone(),
        }
    }
}

/// A room that received at least one student in a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOccupancy {
    pub slot: SlotKey,
    pub room_id: String,
    pub seated: u32,
    pub capacity: u32,
}

/// Result of the seating stage
#[derive(Debug, Clone, Default)]
pub struct SeatingPlan {
    assignments: Vec<SeatAssignment>,
    occupancy: Vec<RoomOccupancy>,
}

impl SeatingPlan {
    /// Seats in slot order, then room order, then seat order
    pub fn assignments(&self) -> &[SeatAssignment] {
        &self.assignments
    }

    /// Occupied rooms in slot order, then room order
    pub fn occupancy(&self) -> &[RoomOccupancy] {
        &self.occupancy
    }

    pub fn seated_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn rows(&self) -> Vec<SeatRow> {
        self.assignments.iter().map(SeatAssignment::to_row).collect()
    }
}

/// Packs students into rooms in room order, filling each room before
/// moving to the next
pub struct SeatingAllocator<'a> {
    rooms: &'a [Room],
}

impl<'a> SeatingAllocator<'a> {
    pub fn new(rooms: &'a [Room]) -> Self {
        Self { rooms }
    }

    /// Total seats across the inventory
    pub fn total_capacity(&self) -> u64 {
        self.rooms.iter().map(|r| u64::from(r.capacity)).sum()
    }

    /// Students of a slot as (student, course) pairs: courses in slot
    /// order, students in enrollment order.
    ///
    /// The scheduler keeps co-enrolled courses apart, so no student
    /// appears twice here.
    pub fn student_queue<'i>(slot: &Slot, index: &'i EnrollmentIndex) -> Vec<(&'i str, &'i str)> {
        let mut queue = Vec::with_capacity(slot.student_count as usize);
        for &idx in &slot.courses {
            let course = index.course(idx);
            for student in &course.students {
                queue.push((student.as_str(), course.course_id.as_str()));
            }
        }
        queue
    }

    /// Seat every slot of the timetable
    pub fn allocate(
        &self,
        timetable: &Timetable,
        index: &EnrollmentIndex,
        diagnostics: &mut Diagnostics,
    ) -> SeatingPlan {
        let mut plan = SeatingPlan::default();

        for slot in timetable.slots() {
            let queue = Self::student_queue(slot, index);
            let mut next = 0usize;

            for room in self.rooms {
                if next >= queue.len() {
                    break;
                }

                let take = (queue.len() - next).min(room.capacity as usize);
                for (offset, (student_id, course_id)) in
                    queue[next..next + take].iter().enumerate()
                {
                    plan.assignments.push(SeatAssignment {
                        slot: slot.key,
                        room_id: room.room_id.clone(),
                        seat_number: offset as u32 + 1,
                        student_id: student_id.to_string(),
                        course_id: course_id.to_string(),
                    });
                }
                next += take;

                debug!(slot = %slot.key, room = %room.room_id, seated = take, "Room filled");
                plan.occupancy.push(RoomOccupancy {
                    slot: slot.key,
                    room_id: room.room_id.clone(),
                    seated: take as u32,
                    capacity: room.capacity,
                });
            }

            if next < queue.len() {
                let missing = queue.len() - next;
                warn!(
                    slot = %slot.key,
                    unseated = missing,
                    capacity = self.total_capacity(),
                    "Room capacity insufficient for slot"
                );
                diagnostics
                    .unseated_students
                    .extend(queue[next..].iter().map(|(student_id, course_id)| {
                        UnseatedStudent {
                            slot: slot.key,
                            student_id: student_id.to_string(),
                            course_id: course_id.to_string(),
                        }
                    }));
            }
        }

        info!(
            seated = plan.assignments.len(),
            rooms_used = plan.occupancy.len(),
            unseated = diagnostics.unseated_student_count(),
            "Seating allocated"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::SlotScheduler;
    use examplan_core::{CourseRecord, EnrollmentRecord, Settings};

    fn seat(
        enrollments: &[(&str, &str)],
        course_ids: &[&str],
        rooms: &[(&str, u32)],
        settings: &Settings,
    ) -> (SeatingPlan, Diagnostics) {
        let enrollments: Vec<EnrollmentRecord> = enrollments
            .iter()
            .map(|(s, c)| EnrollmentRecord::new(*s, *c))
            .collect();
        let courses: Vec<CourseRecord> = course_ids
            .iter()
            .map(|id| CourseRecord::new(*id, *id, "BSc"))
            .collect();
        let room_records: Vec<RoomRecord> =
            rooms.iter().map(|(id, cap)| RoomRecord::new(*id, *cap)).collect();

        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &courses, &mut diagnostics);
        let timetable = SlotScheduler::new(&index, settings).schedule(&mut diagnostics);
        let rooms = Room::from_records(&room_records, &mut diagnostics);
        let plan = SeatingAllocator::new(&rooms).allocate(&timetable, &index, &mut diagnostics);
        (plan, diagnostics)
    }

    #[test]
    fn test_rooms_filled_in_order() {
        let (plan, diagnostics) = seat(
            &[("S1", "A"), ("S2", "A"), ("S3", "A"), ("S4", "B")],
            &["A", "B"],
            &[("R1", 2), ("R2", 5), ("R3", 5)],
            &Settings::default(),
        );

        let seats: Vec<(&str, u32, &str)> = plan
            .assignments()
            .iter()
            .map(|a| (a.room_id.as_str(), a.seat_number, a.student_id.as_str()))
            .collect();
        assert_eq!(
            seats,
            vec![("R1", 1, "S1"), ("R1", 2, "S2"), ("R2", 1, "S3"), ("R2", 2, "S4")]
        );
        assert_eq!(plan.occupancy().len(), 2);
        assert_eq!(plan.occupancy()[1].seated, 2);
        assert!(diagnostics.unseated_students.is_empty());
    }

    #[test]
    fn test_overflow_reported_as_unseated() {
        let (plan, diagnostics) = seat(
            &[("S1", "A"), ("S2", "A"), ("S3", "A")],
            &["A"],
            &[("R1", 2)],
            &Settings::default(),
        );

        assert_eq!(plan.seated_count(), 2);
        assert_eq!(diagnostics.unseated_student_count(), 1);
        assert_eq!(diagnostics.unseated_students[0].student_id, "S3");
        assert_eq!(diagnostics.unseated_students[0].course_id, "A");
    }

    #[test]
    fn test_rooms_reused_across_slots() {
        let (plan, _) = seat(
            &[("S1", "A"), ("S1", "B"), ("S2", "B")],
            &["A", "B"],
            &[("R1", 10)],
            &Settings::default(),
        );

        let rows = plan.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.room_id == "R1"));
        assert_eq!(rows[0].slot, "Slot 1");
        assert_eq!(rows[0].seat_number, 1);
        assert_eq!(rows[2].slot, "Slot 2");
        assert_eq!(rows[2].seat_number, 1);
    }

    #[test]
    fn test_invalid_rooms_skipped() {
        let mut records = vec![
            RoomRecord::new("101", 30),
            RoomRecord::new("", 30),
            RoomRecord::new("102", 0),
            RoomRecord::new("101", 10),
        ];
        records.push(RoomRecord {
            room_id: "101".to_string(),
            block: Some("B".to_string()),
            seating_capacity: 20,
        });

        let mut diagnostics = Diagnostics::new();
        let rooms = Room::from_records(&records, &mut diagnostics);

        let ids: Vec<&str> = rooms.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, vec!["101", "B-101"]);
        assert_eq!(diagnostics.skipped_count(RecordKind::Room), 3);
        assert_eq!(SeatingAllocator::new(&rooms).total_capacity(), 50);
    }

    #[test]
    fn test_no_rooms_leaves_everyone_unseated() {
        let (plan, diagnostics) = seat(&[("S1", "A"), ("S2", "A")], &["A"], &[], &Settings::default());

        assert_eq!(plan.seated_count(), 0);
        assert!(plan.occupancy().is_empty());
        assert_eq!(diagnostics.unseated_student_count(), 2);
    }
}
