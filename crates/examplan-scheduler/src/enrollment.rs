//! Enrollment index built once per run

use examplan_core::{CourseRecord, Diagnostics, EnrollmentRecord, RecordKind};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Position of a course in the index (course-record input order)
pub type CourseIdx = usize;

/// A course with its enrolled students
#[derive(Debug, Clone)]
pub struct Course {
    pub course_id: String,
    pub title: String,
    pub program: String,
    pub school: Option<String>,
    /// Distinct students in enrollment-record order
    pub students: Vec<String>,
}

impl Course {
    pub fn enrolled_count(&self) -> u32 {
        self.students.len() as u32
    }
}

/// Lookup structures derived from enrollment and course records
#[derive(Debug, Clone, Default)]
pub struct EnrollmentIndex {
    courses: Vec<Course>,
    positions: HashMap<String, CourseIdx>,
    student_courses: HashMap<String, Vec<CourseIdx>>,
}

impl EnrollmentIndex {
    /// Build the index.
    ///
    /// Records with a blank id are skipped and reported. Later course records
    /// repeating an id are skipped too. Enrollments naming an unknown course
    /// are ignored, and a repeated (student, course) pair counts once.
    pub fn build(
        enrollments: &[EnrollmentRecord],
        courses: &[CourseRecord],
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut index = Self {
            courses: Vec::with_capacity(courses.len()),
            positions: HashMap::with_capacity(courses.len()),
            student_courses: HashMap::new(),
        };

        for (position, record) in courses.iter().enumerate() {
            let course_id = record.course_id.trim();
            if course_id.is_empty() {
                warn!(position, "Skipping course record without course_id");
                diagnostics.skip(RecordKind::Course, position, "missing course_id");
                continue;
            }
            if index.positions.contains_key(course_id) {
                warn!(position, course_id, "Skipping duplicate course record");
                diagnostics.skip(
                    RecordKind::Course,
                    position,
                    format!("duplicate course_id {}", course_id),
                );
                continue;
            }

            index
                .positions
                .insert(course_id.to_string(), index.courses.len());
            index.courses.push(Course {
                course_id: course_id.to_string(),
                title: record.title.clone(),
                program: record.program.clone(),
                school: record.school.clone(),
                students: Vec::new(),
            });
        }

        let mut unknown_course_rows = 0usize;
        let mut duplicate_rows = 0usize;

        for (position, record) in enrollments.iter().enumerate() {
            let student_id = record.student_id.trim();
            let course_id = record.course_id.trim();

            if student_id.is_empty() || course_id.is_empty() {
                let missing = if student_id.is_empty() {
                    "student_id"
                } else {
                    "course_id"
                };
                warn!(position, missing, "Skipping malformed enrollment record");
                diagnostics.skip(
                    RecordKind::Enrollment,
                    position,
                    format!("missing {}", missing),
                );
                continue;
            }

            let Some(&course) = index.positions.get(course_id) else {
                unknown_course_rows += 1;
                continue;
            };

            let taken = index
                .student_courses
                .entry(student_id.to_string())
                .or_default();
            if taken.contains(&course) {
                duplicate_rows += 1;
                continue;
            }
            taken.push(course);
            index.courses[course].students.push(student_id.to_string());
        }

        if unknown_course_rows > 0 {
            debug!(
                rows = unknown_course_rows,
                "Ignored enrollments for courses without a course record"
            );
        }
        if duplicate_rows > 0 {
            debug!(rows = duplicate_rows, "Collapsed duplicate enrollments");
        }

        info!(
            courses = index.courses.len(),
            students = index.student_courses.len(),
            "Enrollment index built"
        );

        index
    }

    /// Courses in course-record order
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, idx: CourseIdx) -> &Course {
        &self.courses[idx]
    }

    pub fn position(&self, course_id: &str) -> Option<CourseIdx> {
        self.positions.get(course_id).copied()
    }

    /// Courses a student is enrolled in, empty for unknown students
    pub fn courses_of(&self, student_id: &str) -> &[CourseIdx] {
        self.student_courses
            .get(student_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn student_count(&self) -> usize {
        self.student_courses.len()
    }

    /// Courses sharing at least one student with `idx`, including `idx` itself.
    ///
    /// Only direct co-enrollment counts; conflicts are not followed through
    /// chains of different students.
    pub fn conflict_set(&self, idx: CourseIdx) -> HashSet<CourseIdx> {
        let mut conflicts = HashSet::new();
        conflicts.insert(idx);
        for student in &self.courses[idx].students {
            conflicts.extend(self.courses_of(student).iter().copied());
        }
        conflicts
    }

    /// Whether two courses have a student in common
    pub fn share_student(&self, a: CourseIdx, b: CourseIdx) -> bool {
        let (small, other) = if self.courses[a].students.len() <= self.courses[b].students.len() {
            (a, b)
        } else {
            (b, a)
        };
        self.courses[small]
            .students
            .iter()
            .any(|student| self.courses_of(student).contains(&other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses(ids: &[&str]) -> Vec<CourseRecord> {
        ids.iter()
            .map(|id| CourseRecord::new(*id, format!("{} title", id), "BSc"))
            .collect()
    }

    #[test]
    fn test_build_counts_enrollments() {
        let enrollments = vec![
            EnrollmentRecord::new("S1", "C1"),
            EnrollmentRecord::new("S2", "C1"),
            EnrollmentRecord::new("S1", "C2"),
        ];
        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &courses(&["C1", "C2", "C3"]), &mut diagnostics);

        assert_eq!(index.courses().len(), 3);
        assert_eq!(index.course(0).enrolled_count(), 2);
        assert_eq!(index.course(1).enrolled_count(), 1);
        assert_eq!(index.course(2).enrolled_count(), 0);
        assert_eq!(index.courses_of("S1"), &[0, 1]);
        assert_eq!(index.student_count(), 2);
        assert!(diagnostics.skipped_records.is_empty());
    }

    #[test]
    fn test_duplicate_enrollments_counted_once() {
        let enrollments = vec![
            EnrollmentRecord::new("S1", "C1"),
            EnrollmentRecord::new("S1", "C1"),
            EnrollmentRecord::new(" S1 ", "C1"),
        ];
        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &courses(&["C1"]), &mut diagnostics);

        assert_eq!(index.course(0).enrolled_count(), 1);
        assert_eq!(index.courses_of("S1"), &[0]);
    }

    #[test]
    fn test_unknown_course_ignored() {
        let enrollments = vec![
            EnrollmentRecord::new("S1", "C1"),
            EnrollmentRecord::new("S1", "GHOST"),
        ];
        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &courses(&["C1"]), &mut diagnostics);

        assert_eq!(index.courses_of("S1"), &[0]);
        assert_eq!(index.position("GHOST"), None);
        assert!(diagnostics.skipped_records.is_empty());
    }

    #[test]
    fn test_malformed_records_skipped() {
        let enrollments = vec![
            EnrollmentRecord::new("", "C1"),
            EnrollmentRecord::new("S1", "  "),
            EnrollmentRecord::new("S2", "C1"),
        ];
        let mut course_records = courses(&["C1", "C1"]);
        course_records.push(CourseRecord::default());

        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &course_records, &mut diagnostics);

        assert_eq!(index.courses().len(), 1);
        assert_eq!(index.course(0).students, vec!["S2".to_string()]);
        assert_eq!(diagnostics.skipped_count(RecordKind::Enrollment), 2);
        assert_eq!(diagnostics.skipped_count(RecordKind::Course), 2);
        assert_eq!(diagnostics.skipped_records[0].reason, "duplicate course_id C1");
        assert_eq!(diagnostics.skipped_records[2].reason, "missing student_id");
        assert_eq!(diagnostics.skipped_records[3].reason, "missing course_id");
    }

    #[test]
    fn test_conflict_set_is_depth_one() {
        // S1 links C1-C2, S2 links C2-C3; C1 and C3 share nobody.
        let enrollments = vec![
            EnrollmentRecord::new("S1", "C1"),
            EnrollmentRecord::new("S1", "C2"),
            EnrollmentRecord::new("S2", "C2"),
            EnrollmentRecord::new("S2", "C3"),
        ];
        let mut diagnostics = Diagnostics::new();
        let index = EnrollmentIndex::build(&enrollments, &courses(&["C1", "C2", "C3"]), &mut diagnostics);

        let c1 = index.conflict_set(0);
        assert!(c1.contains(&0));
        assert!(c1.contains(&1));
        assert!(!c1.contains(&2));

        assert_eq!(index.conflict_set(1).len(), 3);
        assert!(index.share_student(0, 1));
        assert!(!index.share_student(0, 2));
    }
}
