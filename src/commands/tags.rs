use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::commands::{new_id, now, validation};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Tag, TagInput};
use crate::repository::TagRepository;

fn map_row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[async_trait]
impl TagRepository for Database {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, created_at FROM tags ORDER BY created_at DESC, rowid DESC",
        )?;
        let tags = stmt
            .query_map([], map_row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    async fn save_tag(&self, id: Option<String>, tag: TagInput) -> Result<Tag> {
        validation(tag.validate())?;
        let conn = self.conn()?;

        let id = match id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE tags SET name = ?, slug = ? WHERE id = ?",
                    params![tag.name.trim(), tag.slug, id],
                )?;
                if changed == 0 {
                    return Err(AppError::NotFound(format!("tag {}", id)));
                }
                id
            }
            None => {
                let id = new_id("TAG");
                conn.execute(
                    "INSERT INTO tags (id, name, slug, created_at) VALUES (?, ?, ?, ?)",
                    params![id, tag.name.trim(), tag.slug, now()],
                )?;
                id
            }
        };

        conn.query_row(
            "SELECT id, name, slug, created_at FROM tags WHERE id = ?",
            [&id],
            map_row_to_tag,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("tag {}", id)))
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM tags WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("tag {}", id)));
        }
        Ok(())
    }
}
