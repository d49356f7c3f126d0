//! Conflict-aware first-fit slot scheduling

use examplan_core::{Diagnostics, OversizedCourse, Settings, SlotKey, TimetableRow};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::enrollment::{CourseIdx, EnrollmentIndex};

/// One exam slot and the courses committed to it
#[derive(Debug, Clone)]
pub struct Slot {
    pub key: SlotKey,
    /// Courses in placement order
    pub courses: Vec<CourseIdx>,
    /// Sum of the enrolled counts of `courses`
    pub student_count: u64,
}

/// Why a slot refused a course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    /// A course in the slot shares a student with the candidate
    Conflict,
    /// The slot would exceed `students_per_slot`
    StudentCapacity,
    /// The slot already holds `exams_per_slot` courses
    ExamCapacity,
}

/// Result of the slot scheduling stage
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    slots: Vec<Slot>,
}

impl Timetable {
    /// Slots in index order; none of them is empty
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn course_count(&self) -> usize {
        self.slots.iter().map(|s| s.courses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot holding a course, if it was scheduled
    pub fn slot_of(&self, course: CourseIdx) -> Option<SlotKey> {
        self.slots
            .iter()
            .find(|s| s.courses.contains(&course))
            .map(|s| s.key)
    }

    /// One row per scheduled course, slot by slot
    pub fn rows(&self, index: &EnrollmentIndex) -> Vec<TimetableRow> {
        let mut rows = Vec::with_capacity(self.course_count());
        for slot in &self.slots {
            let day = slot.key.day_label();
            let label = slot.key.slot_label();
            for &idx in &slot.courses {
                let course = index.course(idx);
                rows.push(TimetableRow {
                    day: day.clone(),
                    slot: label.clone(),
                    course_id: course.course_id.clone(),
                    title: course.title.clone(),
                    program: course.program.clone(),
                    school: course.school.clone(),
                    student_count: course.enrolled_count(),
                });
            }
        }
        rows
    }
}

/// Places every schedulable course into the first slot that accepts it
pub struct SlotScheduler<'a> {
    index: &'a EnrollmentIndex,
    settings: &'a Settings,
}

impl<'a> SlotScheduler<'a> {
    pub fn new(index: &'a EnrollmentIndex, settings: &'a Settings) -> Self {
        Self { index, settings }
    }

    /// Courses in placement order: enrolled count descending, ties in
    /// course-record order. Empty courses are left out.
    pub fn placement_order(&self) -> Vec<CourseIdx> {
        let mut order: Vec<CourseIdx> = (0..self.index.courses().len())
            .filter(|&idx| self.index.course(idx).enrolled_count() > 0)
            .collect();
        // sort_by_key is stable
        order.sort_by_key(|&idx| std::cmp::Reverse(self.index.course(idx).enrolled_count()));
        order
    }

    /// Check whether `slot` can take `course`
    pub fn check(
        &self,
        slot: &Slot,
        course: CourseIdx,
        conflicts: &HashSet<CourseIdx>,
    ) -> Option<SlotRejection> {
        if slot.courses.iter().any(|c| conflicts.contains(c)) {
            return Some(SlotRejection::Conflict);
        }

        let size = u64::from(self.index.course(course).enrolled_count());
        if slot.student_count + size > u64::from(self.settings.students_per_slot) {
            return Some(SlotRejection::StudentCapacity);
        }

        if slot.courses.len() >= self.settings.exams_per_slot as usize {
            return Some(SlotRejection::ExamCapacity);
        }

        None
    }

    /// Run the scheduler. Placements are never revisited.
    pub fn schedule(&self, diagnostics: &mut Diagnostics) -> Timetable {
        let mut slots: Vec<Slot> = Vec::new();

        for idx in self.placement_order() {
            let course = self.index.course(idx);

            if self.settings.is_blacklisted(&course.course_id) {
                debug!(course = %course.course_id, "Skipping blacklisted course");
                diagnostics.blacklisted_courses.push(course.course_id.clone());
                continue;
            }

            let conflicts = self.index.conflict_set(idx);
            let mut chosen = None;

            for (position, slot) in slots.iter().enumerate() {
                match self.check(slot, idx, &conflicts) {
                    None => {
                        chosen = Some(position);
                        break;
                    }
                    Some(reason) => {
                        debug!(
                            course = %course.course_id,
                            slot = %slot.key,
                            reason = ?reason,
                            "Slot rejected course"
                        );
                    }
                }
            }

            let position = match chosen {
                Some(position) => position,
                None => {
                    // A fresh slot has no conflicts and no courses, so only
                    // an oversized course can break its capacity.
                    let key = SlotKey::new(slots.len(), self.settings.slots_per_day);
                    slots.push(Slot {
                        key,
                        courses: Vec::new(),
                        student_count: 0,
                    });

                    if course.enrolled_count() > self.settings.students_per_slot {
                        warn!(
                            course = %course.course_id,
                            students = course.enrolled_count(),
                            limit = self.settings.students_per_slot,
                            slot = %key,
                            "Course exceeds students_per_slot on its own, placing it alone"
                        );
                        diagnostics.oversized_courses.push(OversizedCourse {
                            course_id: course.course_id.clone(),
                            student_count: course.enrolled_count(),
                            students_per_slot: self.settings.students_per_slot,
                            slot: key,
                        });
                    }
                    slots.len() - 1
                }
            };

            let slot = &mut slots[position];
            slot.courses.push(idx);
            slot.student_count += u64::from(course.enrolled_count());
            debug!(course = %course.course_id, slot = %slot.key, "Course placed");
        }

        let timetable = Timetable { slots };
        info!(
            slots = timetable.slots.len(),
            courses = timetable.course_count(),
            "Timetable scheduled"
        );
        timetable
    }
}
