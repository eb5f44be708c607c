//! Record sources for reclink: CSV files and SQLite tables.
//!
//! Everything here produces `reclink_linkage` values; matching stays in the
//! engine crate.

pub mod csv;
pub mod sqlite;
