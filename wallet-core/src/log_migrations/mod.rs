//! Schema for the client event log (logs.duckdb)
//!
//! SQL files are embedded with include_str! and applied in name order.
//! `000_migrations.sql` bootstraps the bookkeeping table and is always first.

/// (filename, sql) pairs. New migrations get the next NNN_ prefix and are
/// appended here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
