pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod search;
pub mod slug;
pub mod stats;

#[cfg(test)]
pub mod test_helpers;

use std::sync::Arc;

pub use config::{AppConfig, SearchConfig};
pub use db::Database;
pub use error::{AppError, Result};
pub use search::{Direction, SearchController};
pub use slug::{generate_slug, is_valid_slug, SlugField};

/// Everything the blog needs at runtime, built once at start-up and passed
/// by reference. Dropping it closes the database.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<Database>,
}

impl AppContext {
    pub fn init(config: AppConfig) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_path = config.database_path.to_string_lossy().into_owned();
        log::info!("Opening database at {}", db_path);

        let db = match Database::with_backup_retention(&db_path, config.backup_retention) {
            Ok(db) => db,
            Err(e) => {
                log::error!("Database initialization failed: {}", e);
                if let Some(parent) = config.database_path.parent() {
                    log::error!("Pre-migration backups are kept in {:?}", parent.join("backups"));
                }
                return Err(e);
            }
        };

        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    /// A fresh search popup bound to this context's store
    pub fn search_controller(&self) -> SearchController {
        SearchController::new(self.db.clone(), self.config.search.clone())
    }
}
