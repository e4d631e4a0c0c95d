use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::commands::{like_pattern, new_id, now, page_offset, search_term, validation};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Page, Post, PostFilters, PostInput, PublishStatus, Tag};
use crate::repository::PostRepository;

const POST_SELECT: &str = "SELECT p.id, p.title, p.slug, p.content, p.excerpt, p.cover_image,
        p.category_id, c.name, p.author_name, p.status, p.published_at, p.created_at, p.updated_at
     FROM posts p
     LEFT JOIN categories c ON c.id = p.category_id";

fn map_row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        cover_image: row.get(5)?,
        category_id: row.get(6)?,
        category_name: row.get(7)?,
        author_name: row.get(8)?,
        status: row.get(9)?,
        published_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        tags: Vec::new(),
    })
}

fn load_tags(conn: &Connection, post_id: &str) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.name, t.slug, t.created_at
         FROM post_tags pt
         JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map([post_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

fn query_posts<P: rusqlite::Params>(conn: &Connection, query: &str, params: P) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(query)?;
    let mut posts = stmt
        .query_map(params, map_row_to_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for post in posts.iter_mut() {
        post.tags = load_tags(conn, &post.id)?;
    }
    Ok(posts)
}

fn load_post(conn: &Connection, id: &str) -> Result<Post> {
    let post = conn
        .query_row(&format!("{} WHERE p.id = ?", POST_SELECT), [id], map_row_to_post)
        .optional()?;
    let mut post = post.ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;
    post.tags = load_tags(conn, id)?;
    Ok(post)
}

/// Unique tag ids, first occurrence wins
fn dedup_tag_ids(tag_ids: &[String]) -> Vec<&str> {
    let mut seen = Vec::new();
    for id in tag_ids {
        if !seen.contains(&id.as_str()) {
            seen.push(id.as_str());
        }
    }
    seen
}

#[async_trait]
impl PostRepository for Database {
    async fn list_posts(&self, filters: PostFilters) -> Result<Vec<Post>> {
        let conn = self.conn()?;

        let mut query = format!("{} WHERE 1=1", POST_SELECT);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filters.status {
            query.push_str(" AND p.status = ?");
            params.push(Box::new(status));
        }
        if let Some(category_id) = &filters.category_id {
            query.push_str(" AND p.category_id = ?");
            params.push(Box::new(category_id.clone()));
        }
        if let Some(term) = search_term(&filters.search) {
            query.push_str(" AND unicode_lower(p.title) LIKE ? ESCAPE '\\'");
            params.push(Box::new(like_pattern(term)));
        }
        query.push_str(" ORDER BY p.created_at DESC, p.rowid DESC");

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        query_posts(&conn, &query, param_refs.as_slice())
    }

    async fn list_published_posts(
        &self,
        page: u32,
        page_size: u32,
        category_id: Option<String>,
    ) -> Result<Page<Post>> {
        let conn = self.conn()?;
        let offset = page_offset(page, page_size);

        let (total, data) = match &category_id {
            Some(category_id) => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM posts WHERE status = 'published' AND category_id = ?",
                    [category_id],
                    |row| row.get(0),
                )?;
                let data = query_posts(
                    &conn,
                    &format!(
                        "{} WHERE p.status = 'published' AND p.category_id = ?
                         ORDER BY p.published_at DESC, p.rowid DESC LIMIT ? OFFSET ?",
                        POST_SELECT
                    ),
                    params![category_id, page_size, offset],
                )?;
                (total, data)
            }
            None => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM posts WHERE status = 'published'",
                    [],
                    |row| row.get(0),
                )?;
                let data = query_posts(
                    &conn,
                    &format!(
                        "{} WHERE p.status = 'published'
                         ORDER BY p.published_at DESC, p.rowid DESC LIMIT ? OFFSET ?",
                        POST_SELECT
                    ),
                    params![page_size, offset],
                )?;
                (total, data)
            }
        };

        Ok(Page {
            data,
            total,
            page: page.max(1),
            page_size,
        })
    }

    async fn get_post(&self, id: &str) -> Result<Post> {
        let conn = self.conn()?;
        load_post(&conn, id)
    }

    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Post> {
        let conn = self.conn()?;
        let post = conn
            .query_row(
                &format!("{} WHERE p.slug = ? AND p.status = 'published'", POST_SELECT),
                [slug],
                map_row_to_post,
            )
            .optional()?;
        let mut post = post.ok_or_else(|| AppError::NotFound(format!("post {}", slug)))?;
        post.tags = load_tags(&conn, &post.id)?;
        Ok(post)
    }

    async fn related_posts(&self, post: &Post, limit: u32) -> Result<Vec<Post>> {
        let Some(category_id) = &post.category_id else {
            return Ok(Vec::new());
        };
        let conn = self.conn()?;
        query_posts(
            &conn,
            &format!(
                "{} WHERE p.status = 'published' AND p.category_id = ? AND p.id != ?
                 ORDER BY p.published_at DESC, p.rowid DESC LIMIT ?",
                POST_SELECT
            ),
            params![category_id, post.id, limit],
        )
    }

    async fn save_post(&self, id: Option<String>, post: PostInput, status: PublishStatus) -> Result<Post> {
        validation(post.validate())?;
        let mut conn = self.conn()?;
        let now = now();

        let tx = conn.transaction()?;

        let post_id = match id {
            Some(id) => {
                // Keep the first publish time when re-saving a published post
                let changed = tx.execute(
                    "UPDATE posts SET
                        title = ?1, slug = ?2, content = ?3, excerpt = ?4, cover_image = ?5,
                        category_id = ?6, author_name = ?7, status = ?8,
                        published_at = CASE WHEN ?8 = 'published' THEN COALESCE(published_at, ?9) ELSE NULL END,
                        updated_at = ?9
                     WHERE id = ?10",
                    params![
                        post.title.trim(), post.slug, post.content, post.excerpt, post.cover_image,
                        post.category_id, post.author_name, status, now, id
                    ],
                )?;
                if changed == 0 {
                    return Err(AppError::NotFound(format!("post {}", id)));
                }
                id
            }
            None => {
                let id = new_id("POST");
                let published_at = (status == PublishStatus::Published).then_some(now);
                tx.execute(
                    "INSERT INTO posts (
                        id, title, slug, content, excerpt, cover_image, category_id, author_name,
                        status, published_at, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        id, post.title.trim(), post.slug, post.content, post.excerpt, post.cover_image,
                        post.category_id, post.author_name, status, published_at, now, now
                    ],
                )?;
                id
            }
        };

        // Replace tag associations
        tx.execute("DELETE FROM post_tags WHERE post_id = ?", [&post_id])?;
        for tag_id in dedup_tag_ids(&post.tag_ids) {
            tx.execute(
                "INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)",
                params![post_id, tag_id],
            )?;
        }

        tx.commit()?;

        load_post(&conn, &post_id)
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM posts WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn toggle_post_status(&self, id: &str) -> Result<Post> {
        let conn = self.conn()?;
        let current = load_post(&conn, id)?;
        let status = current.status.toggled();
        let published_at = (status == PublishStatus::Published).then(now);

        conn.execute(
            "UPDATE posts SET status = ?, published_at = ?, updated_at = ? WHERE id = ?",
            params![status, published_at, now(), id],
        )?;

        load_post(&conn, id)
    }
}
