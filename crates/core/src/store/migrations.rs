//! Store schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its version row.

use tokio_rusqlite::{Connection, params, rusqlite};

use super::Error;

/// Ordered schema steps, keyed by version.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_caches.sql"))];

const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL
    )";

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> { apply(conn, MIGRATIONS) })
        .await
        .map_err(Error::from)
}

fn apply(conn: &mut rusqlite::Connection, migrations: &[(i64, &str)]) -> Result<(), Error> {
    conn.execute(CREATE_VERSION_TABLE, [])?;
    let applied: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

    for &(version, sql) in migrations.iter().filter(|(version, _)| *version > applied) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)
            .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
        tx.execute(
            "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::debug!(version, "applied store migration");
    }

    Ok(())
}
