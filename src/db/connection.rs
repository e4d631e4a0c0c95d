use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use crate::db::migration_runner::MigrationRunner;
use crate::error::Result;

pub struct Database {
    pub conn: Mutex<Connection>,
}

/// `unicode_lower(text)`: full Unicode lower-casing for search filters.
/// SQLite's built-in `lower()` and `LIKE` only fold ASCII.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;
    Ok(())
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        Self::with_backup_retention(db_path, MigrationRunner::DEFAULT_BACKUP_RETENTION)
    }

    pub fn with_backup_retention(db_path: &str, backup_retention: usize) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::initialize(conn, db_path, MigrationRunner::new(backup_retention))
    }

    /// Private database that disappears with the handle
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, ":memory:", MigrationRunner::default())
    }

    fn initialize(conn: Connection, db_path: &str, runner: MigrationRunner) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        register_functions(&conn)?;

        if db_path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        log::info!("=== Starting database migration check ===");

        let current_version = runner.get_current_version(&conn)?;
        log::info!("Current schema version: {:?}", current_version);

        let applied = runner.run_pending_migrations(&conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;

        if let Some(version) = runner.get_current_version(&conn)? {
            log::info!("Final schema version: {}", version);
        }

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection; a poisoned lock surfaces as a database error
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_has_schema() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in ["categories", "tags", "posts", "post_tags", "trading_reports", "trades"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let enabled: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_unicode_lower_folds_vietnamese() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let lowered: String = conn
            .query_row("SELECT unicode_lower('ĐƯỜNG Đi Của GIÁ')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lowered, "đường đi của giá");

        let null: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            db.conn()
                .unwrap()
                .execute(
                    "INSERT INTO tags (id, name, slug, created_at) VALUES ('t1', 'BTC', 'btc', 0)",
                    [],
                )
                .unwrap();
        }

        let db = Database::new(path).unwrap();
        let count: i32 = db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
