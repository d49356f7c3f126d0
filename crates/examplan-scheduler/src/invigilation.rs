//! Invigilator assignment for occupied rooms

use examplan_core::{
    Diagnostics, InvigilatorRow, InvigilatorStrategy, RecordKind, SlotKey, StaffRecord,
    UnfilledRoom,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::seating::SeatingPlan;

/// A staff member on the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    pub staff_id: String,
    pub name: String,
    pub department: String,
    /// Assignments allowed across the run
    pub quota: u32,
}

impl Staff {
    /// Turn staff records into the roster, keeping input order.
    ///
    /// Records with a blank id or a repeated id are skipped and reported.
    pub fn from_records(records: &[StaffRecord], diagnostics: &mut Diagnostics) -> Vec<Staff> {
        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let staff_id = record.staff_id.trim();
            if staff_id.is_empty() {
                warn!(position, "Skipping staff record without staff_id");
                diagnostics.skip(RecordKind::Staff, position, "missing staff_id");
                continue;
            }
            if !seen.insert(staff_id.to_string()) {
                warn!(position, staff = staff_id, "Skipping duplicate staff record");
                diagnostics.skip(
                    RecordKind::Staff,
                    position,
                    format!("duplicate staff_id {}", staff_id),
                );
                continue;
            }

            roster.push(Staff {
                staff_id: staff_id.to_string(),
                name: record.name.clone(),
                department: record.department.clone(),
                quota: record.total_slots_quota,
            });
        }

        roster
    }
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    staff_id: String,
    remaining_quota: u32,
    used_slots: HashSet<usize>,
}

/// Quota and slot bookkeeping owned by a single run
#[derive(Debug, Clone)]
pub struct StaffLedger {
    entries: Vec<LedgerEntry>,
}

impl StaffLedger {
    pub fn new(roster: &[Staff]) -> Self {
        Self {
            entries: roster
                .iter()
                .map(|s| LedgerEntry {
                    staff_id: s.staff_id.clone(),
                    remaining_quota: s.quota,
                    used_slots: HashSet::new(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Quota left and not yet used in this slot
    pub fn is_eligible(&self, staff: usize, slot: SlotKey) -> bool {
        let entry = &self.entries[staff];
        entry.remaining_quota > 0 && !entry.used_slots.contains(&slot.index)
    }

    pub fn remaining(&self, staff: usize) -> u32 {
        self.entries[staff].remaining_quota
    }

    pub fn remaining_quota(&self, staff_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.staff_id == staff_id)
            .map(|e| e.remaining_quota)
    }

    fn record(&mut self, staff: usize, slot: SlotKey) {
        let entry = &mut self.entries[staff];
        entry.remaining_quota -= 1;
        entry.used_slots.insert(slot.index);
    }
}

/// Picks the staff member for the next room
pub trait StaffSelector {
    /// Return an eligible roster position, or `None` if nobody qualifies
    fn select(&mut self, slot: SlotKey, ledger: &StaffLedger) -> Option<usize>;
}

/// Probes the roster from a cursor shared by the whole run.
///
/// The cursor advances on every probe, hit or miss, and is never reset
/// between slots.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    cursor: usize,
}

impl StaffSelector for RoundRobinSelector {
    fn select(&mut self, slot: SlotKey, ledger: &StaffLedger) -> Option<usize> {
        let n = ledger.len();
        for _ in 0..n {
            let candidate = self.cursor % n;
            self.cursor += 1;
            if ledger.is_eligible(candidate, slot) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Picks the eligible staff member with the most remaining quota
#[derive(Debug, Default)]
pub struct QuotaPrioritySelector;

impl StaffSelector for QuotaPrioritySelector {
    fn select(&mut self, slot: SlotKey, ledger: &StaffLedger) -> Option<usize> {
        let mut best: Option<usize> = None;
        for candidate in 0..ledger.len() {
            if !ledger.is_eligible(candidate, slot) {
                continue;
            }
            match best {
                Some(current) if ledger.remaining(current) >= ledger.remaining(candidate) => {}
                _ => best = Some(candidate),
            }
        }
        best
    }
}

/// Create the selector for a configured strategy
pub fn selector_for(strategy: InvigilatorStrategy) -> Box<dyn StaffSelector> {
    match strategy {
        InvigilatorStrategy::RoundRobin => Box::new(RoundRobinSelector::default()),
        InvigilatorStrategy::QuotaPriority => Box::new(QuotaPrioritySelector),
    }
}

/// One invigilated room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvigilatorAssignment {
    pub slot: SlotKey,
    pub room_id: String,
    pub staff_id: String,
    pub staff_name: String,
    pub staff_dept: String,
}

impl InvigilatorAssignment {
    pub fn to_row(&self) -> InvigilatorRow {
        InvigilatorRow {
            day: self.slot.day_label(),
            slot: self.slot.slot_label(),
            room_id: self.room_id.clone(),
            staff_id: self.staff_id.clone(),
            staff_name: self.staff_name.clone(),
            staff_dept: self.staff_dept.clone(),
        }
    }
}

/// Result of the invigilation stage
#[derive(Debug, Clone)]
pub struct InvigilationPlan {
    assignments: Vec<InvigilatorAssignment>,
    ledger: StaffLedger,
}

impl InvigilationPlan {
    pub fn assignments(&self) -> &[InvigilatorAssignment] {
        &self.assignments
    }

    /// Final quota state of the run
    pub fn ledger(&self) -> &StaffLedger {
        &self.ledger
    }

    pub fn rows(&self) -> Vec<InvigilatorRow> {
        self.assignments
            .iter()
            .map(InvigilatorAssignment::to_row)
            .collect()
    }
}

/// Assigns one staff member to every occupied (slot, room) pair
pub struct InvigilatorAssigner<'a> {
    roster: &'a [Staff],
    strategy: InvigilatorStrategy,
}

impl<'a> InvigilatorAssigner<'a> {
    pub fn new(roster: &'a [Staff], strategy: InvigilatorStrategy) -> Self {
        Self { roster, strategy }
    }

    pub fn assign(&self, seating: &SeatingPlan, diagnostics: &mut Diagnostics) -> InvigilationPlan {
        let mut ledger = StaffLedger::new(self.roster);
        let mut selector = selector_for(self.strategy);
        let mut assignments = Vec::with_capacity(seating.occupancy().len());

        for room in seating.occupancy() {
            match selector.select(room.slot, &ledger) {
                Some(position) => {
                    ledger.record(position, room.slot);
                    let staff = &self.roster[position];
                    debug!(
                        slot = %room.slot,
                        room = %room.room_id,
                        staff = %staff.staff_id,
                        remaining = ledger.remaining(position),
                        "Invigilator assigned"
                    );
                    assignments.push(InvigilatorAssignment {
                        slot: room.slot,
                        room_id: room.room_id.clone(),
                        staff_id: staff.staff_id.clone(),
                        staff_name: staff.name.clone(),
                        staff_dept: staff.department.clone(),
                    });
                }
                None => {
                    warn!(
                        slot = %room.slot,
                        room = %room.room_id,
                        "No eligible invigilator for room"
                    );
                    diagnostics.unfilled_rooms.push(UnfilledRoom {
                        slot: room.slot,
                        room_id: room.room_id.clone(),
                    });
                }
            }
        }

        info!(
            strategy = %self.strategy,
            assigned = assignments.len(),
            unfilled = diagnostics.unfilled_room_count(),
            "Invigilators assigned"
        );

        InvigilationPlan {
            assignments,
            ledger,
        }
    }
}
