//! examplan-scheduler: Allocation pipeline for examplan
//!
//! This crate runs the three allocation stages over an enrollment index:
//! - Conflict-aware first-fit slot scheduling
//! - First-fit seating of each slot into rooms
//! - Quota-bounded invigilator assignment
//!
//! Each run owns its derived state; nothing is shared between runs.

pub mod enrollment;
pub mod invigilation;
pub mod pipeline;
pub mod seating;
pub mod summary;
pub mod timetable;
pub mod validation;

pub use enrollment::{Course, EnrollmentIndex};
pub use invigilation::{InvigilationPlan, InvigilatorAssigner, Staff, StaffLedger, StaffSelector};
pub use pipeline::{AllocationPlan, PlanOutput, Planner, Stage};
pub use seating::{Room, SeatingAllocator, SeatingPlan};
pub use summary::PlanSummary;
pub use timetable::{Slot, SlotScheduler, Timetable};
pub use validation::{verify_plan, Violation, ViolationKind};
