//! examplan-core: Core types for the examplan allocation pipeline
//!
//! This crate provides the types shared by every pipeline stage:
//! - Input records (enrollments, courses, rooms, staff)
//! - Slot keys and output rows
//! - Settings and configuration
//! - Error handling and diagnostics

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;

pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use model::*;
