use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
    backup_retention: usize,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BACKUP_RETENTION)
    }
}

impl MigrationRunner {
    pub const DEFAULT_BACKUP_RETENTION: usize = 5;

    pub fn new(backup_retention: usize) -> Self {
        Self {
            migrations: Self::collect_migrations(),
            backup_retention,
        }
    }

    fn collect_migrations() -> Vec<Migration> {
        vec![
            Migration::new(0, "bootstrap", include_str!("migrations/000_bootstrap.sql")),
            Migration::new(
                1,
                "content_schema",
                include_str!("migrations/001_content_schema.sql"),
            ),
            Migration::new(
                2,
                "trading_reports",
                include_str!("migrations/002_trading_reports.sql"),
            ),
            Migration::new(3, "trades", include_str!("migrations/003_trades.sql")),
        ]
    }

    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        let fresh = !self.has_schema_migrations_table(conn)?;
        if fresh {
            log::info!("No schema_migrations table - bootstrapping migration system");
            self.apply_migration(conn, &self.migrations[0])?;
        }

        let current_version = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| match current_version {
                Some(v) => m.version > v,
                None => m.version > 0,
            })
            .collect();

        let Some(target) = pending.last() else {
            return Ok(0);
        };

        log::info!("Found {} pending migrations", pending.len());

        // Only an existing on-disk database has anything worth backing up
        let backup_path = if !fresh && db_path != ":memory:" {
            let path = self.create_backup(conn, Path::new(db_path), target.version)?;
            log::info!("Backup created: {}", path.display());
            Some(path)
        } else {
            None
        };

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log::error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
                if let Some(path) = &backup_path {
                    log::error!("Backup available at: {}", path.display());
                }
                return Err(e);
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = Instant::now();

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;

        let execution_time = start.elapsed().as_millis() as i64;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, notes)
             VALUES (?, ?, ?, ?, ?, NULL)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp(),
                migration.checksum(),
                execution_time
            ],
        )?;

        tx.commit()?;

        log::info!(
            "Applied migration {} ({}) in {}ms",
            migration.version,
            migration.name,
            execution_time
        );

        Ok(())
    }

    /// Fail if an applied migration's SQL has changed since it ran
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT version, name, checksum FROM schema_migrations WHERE checksum IS NOT NULL ORDER BY version",
        )?;

        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (version, name, stored_checksum) in applied {
            if let Some(migration) = self.migrations.iter().find(|m| m.version == version) {
                let expected_checksum = migration.checksum();
                if stored_checksum != expected_checksum {
                    log::error!("Checksum mismatch for migration {} ({})", version, name);
                    log::error!("Expected: {}", expected_checksum);
                    log::error!("Actual:   {}", stored_checksum);
                    return Err(AppError::Database(format!(
                        "migration {} ({}) was modified after it was applied",
                        version, name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        if !self.has_schema_migrations_table(conn)? {
            return Ok(None);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .optional()?
            .flatten();

        Ok(version)
    }

    fn create_backup(&self, conn: &Connection, db_path: &Path, target_version: u32) -> Result<PathBuf> {
        let db_dir = db_path
            .parent()
            .ok_or_else(|| AppError::Database(format!("no parent directory for {}", db_path.display())))?;

        let backup_dir = db_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let backup_name = format!(
            "pre_migration_v{}_{}.db",
            target_version,
            chrono::Utc::now().timestamp_millis()
        );
        let backup_path = backup_dir.join(&backup_name);

        let mut dst = Connection::open(&backup_path)?;
        {
            let backup = rusqlite::backup::Backup::new(conn, &mut dst)?;
            backup.run_to_completion(5, Duration::from_millis(250), None)?;
        }

        let integrity: String = dst.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            log::error!("Backup integrity check failed: {}", integrity);
            return Err(AppError::Database(format!(
                "backup integrity check failed: {}",
                integrity
            )));
        }

        let size = fs::metadata(&backup_path)?.len();
        log::info!(
            "Backup created successfully: {} ({:.2} MB)",
            backup_path.display(),
            size as f64 / 1_048_576.0
        );

        self.cleanup_old_backups(&backup_dir);

        Ok(backup_path)
    }

    /// Keep the newest `backup_retention` pre-migration backups
    fn cleanup_old_backups(&self, backup_dir: &Path) {
        let entries = match fs::read_dir(backup_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to read backup directory: {}", e);
                return;
            }
        };

        let mut backups: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|s| s.to_str()) == Some("db")
                    && path
                        .file_name()
                        .and_then(|s| s.to_str())
                        .is_some_and(|s| s.starts_with("pre_migration_"))
            })
            .collect();

        // Names end in a millisecond timestamp; order by it, oldest first
        backups.sort_by_key(|path| backup_timestamp(path));

        if backups.len() > self.backup_retention {
            for path in backups.iter().take(backups.len() - self.backup_retention) {
                if let Err(e) = fs::remove_file(path) {
                    log::warn!("Failed to delete old backup {}: {}", path.display(), e);
                }
            }
        }
    }

    fn has_schema_migrations_table(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn backup_timestamp(path: &Path) -> i64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('_').next())
        .and_then(|ts| ts.parse().ok())
        .unwrap_or(0)
}
