//! Reconciliation of a target against a list of checks.

pub mod reconciler;
pub mod report;

pub use reconciler::{Reconciler, NO_AUTOMATIC_FIX};
pub use report::{status_line, Report, ReportSummary};
