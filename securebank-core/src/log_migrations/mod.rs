//! Log database migrations
//!
//! SQL files are embedded with include_str! and applied in name order.
//! `000_migrations.sql` bootstraps the tracking table and always comes first.

/// (filename, sql) pairs; add new files here as NNN_description.sql
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
