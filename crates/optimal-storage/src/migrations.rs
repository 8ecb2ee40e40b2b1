//! Database schema migrations.
//!
//! Applies the initial schema: the `account` table owned by the account
//! subsystem, the per-user `user` state table, and `schema_migrations`.

use rusqlite::Connection;
use tracing::info;

use optimal_core::error::OptimalError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), OptimalError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| OptimalError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| OptimalError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: accounts and user state.
fn apply_v1(conn: &Connection) -> Result<(), OptimalError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS account (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            username    TEXT,
            email       TEXT,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Column names match the agent runtime's adapter.
        CREATE TABLE IF NOT EXISTS \"user\" (
            userId          TEXT PRIMARY KEY NOT NULL
                            REFERENCES account(id) ON DELETE CASCADE,
            walletAddress   TEXT,
            vaultAddress    TEXT,
            strategy        TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_user_wallet
            ON \"user\" (walletAddress)
            WHERE walletAddress IS NOT NULL;

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| OptimalError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
