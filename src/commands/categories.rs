use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::commands::{new_id, now, validation};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryInput};
use crate::repository::CategoryRepository;

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.slug, c.description,
        (SELECT COUNT(*) FROM posts p WHERE p.category_id = c.id),
        c.created_at, c.updated_at
     FROM categories c";

fn map_row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        post_count: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn load_category(conn: &Connection, id: &str) -> Result<Category> {
    conn.query_row(&format!("{} WHERE c.id = ?", CATEGORY_SELECT), [id], map_row_to_category)
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("category {}", id)))
}

#[async_trait]
impl CategoryRepository for Database {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY c.created_at DESC, c.rowid DESC",
            CATEGORY_SELECT
        ))?;
        let categories = stmt
            .query_map([], map_row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    async fn save_category(&self, id: Option<String>, category: CategoryInput) -> Result<Category> {
        validation(category.validate())?;
        let conn = self.conn()?;
        let now = now();

        let id = match id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE categories SET name = ?, slug = ?, description = ?, updated_at = ? WHERE id = ?",
                    params![category.name.trim(), category.slug, category.description, now, id],
                )?;
                if changed == 0 {
                    return Err(AppError::NotFound(format!("category {}", id)));
                }
                id
            }
            None => {
                let id = new_id("CAT");
                conn.execute(
                    "INSERT INTO categories (id, name, slug, description, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    params![id, category.name.trim(), category.slug, category.description, now, now],
                )?;
                id
            }
        };

        load_category(&conn, &id)
    }

    async fn delete_category(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        // Posts in the category fall back to uncategorised via ON DELETE SET NULL
        let deleted = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("category {}", id)));
        }
        log::info!("Deleted category {}", id);
        Ok(())
    }
}
