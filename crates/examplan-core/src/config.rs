//! Configuration types for examplan

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{ExamplanError, ExamplanResult};

/// Planner configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Allocation settings
    pub settings: Settings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PlannerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> ExamplanResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExamplanError::Config(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| ExamplanError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Settings that bound every pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of exam slots per day
    pub slots_per_day: u32,
    /// Maximum number of courses examined in one slot
    pub exams_per_slot: u32,
    /// Maximum cumulative enrollment of one slot
    pub students_per_slot: u32,
    /// Courses excluded from scheduling entirely
    pub blacklist_courses: BTreeSet<String>,
    /// How invigilators are picked for occupied rooms
    pub invigilator_strategy: InvigilatorStrategy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            slots_per_day: 2,
            exams_per_slot: 10,
            students_per_slot: 8000,
            blacklist_courses: BTreeSet::new(),
            invigilator_strategy: InvigilatorStrategy::RoundRobin,
        }
    }
}

impl Settings {
    /// Reject settings the scheduler cannot run with.
    ///
    /// Reports the first offending setting in declaration order.
    pub fn validate(&self) -> ExamplanResult<()> {
        let limits = [
            ("slots_per_day", self.slots_per_day),
            ("exams_per_slot", self.exams_per_slot),
            ("students_per_slot", self.students_per_slot),
        ];

        for (setting, value) in limits {
            if value == 0 {
                return Err(ExamplanError::InvalidSetting {
                    setting,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Whether a course is excluded from scheduling
    pub fn is_blacklisted(&self, course_id: &str) -> bool {
        self.blacklist_courses.contains(course_id)
    }
}

/// Invigilator selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvigilatorStrategy {
    /// Single cursor over the roster, shared by the whole run
    #[default]
    RoundRobin,
    /// Eligible staff member with the most remaining quota, ties by roster order
    QuotaPriority,
}

impl std::fmt::Display for InvigilatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvigilatorStrategy::RoundRobin => write!(f, "round-robin"),
            InvigilatorStrategy::QuotaPriority => write!(f, "quota-priority"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or env-filter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
