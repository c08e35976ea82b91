//! SQL schema initialization.
//!
//! Ledger and purchase log share one database file.

use rusqlite::Connection;

use crate::error::Result;

/// Schema version for migration tracking.
pub const SCHEMA_VERSION: u32 = 2;

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist. Idempotent.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    match current_version {
        None => {
            create_tables(conn)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
        Some(version) if version < SCHEMA_VERSION => {
            migrate_schema(conn, version)?;
            conn.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])?;
        }
        Some(_) => {}
    }

    Ok(())
}

/// Apply schema migrations from the given version to the current version.
fn migrate_schema(conn: &Connection, from_version: u32) -> Result<()> {
    // Version 1 logged purchases without the strategy that produced them.
    if from_version < 2 {
        if let Err(e) = conn.execute(
            "ALTER TABLE purchases ADD COLUMN strategy TEXT NOT NULL DEFAULT 'sequential'",
            [],
        ) {
            if !e.to_string().contains("duplicate column") {
                tracing::warn!(error = %e, "Failed to add strategy column to purchases");
            }
        }
    }

    Ok(())
}

/// Create all database tables.
fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS content (
            fingerprint BLOB PRIMARY KEY,
            price INTEGER NOT NULL,
            owner TEXT NOT NULL,
            uri TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            revenue INTEGER NOT NULL DEFAULT 0,
            access_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_content_owner ON content(owner)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_content_created ON content(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS licenses (
            holder TEXT NOT NULL,
            fingerprint BLOB NOT NULL,
            price_paid INTEGER NOT NULL,
            transfer_ref TEXT NOT NULL,
            issued_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (holder, fingerprint)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS purchases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fingerprint BLOB NOT NULL,
            payer TEXT NOT NULL,
            price INTEGER NOT NULL,
            transfer_ref TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            tag BLOB NOT NULL,
            strategy TEXT NOT NULL DEFAULT 'sequential'
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchases_payer ON purchases(payer, timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchases_fingerprint ON purchases(fingerprint)",
        [],
    )?;

    Ok(())
}
