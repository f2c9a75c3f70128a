//! Tabular exports for course roster reports.
//!
//! The report types themselves (snapshots, deltas, cohort statistics) live
//! in `curricle-core`; this crate only encodes them for spreadsheet
//! consumers.

pub mod csv;
