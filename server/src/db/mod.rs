// server/src/db/mod.rs

//! Ledger Store access: all persistent reads and writes, grouped by
//! aggregate. Runtime-checked queries (`query_as`/`bind`); multi-row writes
//! that must appear atomic run inside a single transaction here.

pub mod catalog;
pub mod enrollments;
pub mod orders;
pub mod progress;
