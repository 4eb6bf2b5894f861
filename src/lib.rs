//! Timesheet Export Service Library
//!
//! This library turns a weekly timesheet submission (employee name plus
//! per-project daily hours) into a populated xlsx workbook on disk. A dated
//! template is bootstrapped on first use; submitted hours are merged into it
//! under a quarter-hour rounding policy and saved as a timestamped file.

pub mod helpers;
pub mod models;
pub mod service;

pub use service::TimesheetService;

// Re-export key types for convenience
pub use helpers::config::EngineConfig;
pub use helpers::excel::ExportError;
pub use models::timesheet::{ProjectEntry, TimesheetSubmission};
