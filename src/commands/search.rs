use async_trait::async_trait;
use rusqlite::params;

use crate::commands::like_pattern;
use crate::db::Database;
use crate::error::Result;
use crate::models::{PostSearchHit, ReportSearchHit};
use crate::repository::SearchSource;

#[async_trait]
impl SearchSource for Database {
    async fn search_posts(&self, term: &str, limit: u32) -> Result<Vec<PostSearchHit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT p.id, p.title, p.slug, p.excerpt, p.published_at, c.name
             FROM posts p
             LEFT JOIN categories c ON c.id = p.category_id
             WHERE p.status = 'published'
               AND (unicode_lower(p.title) LIKE ?1 ESCAPE '\\'
                    OR unicode_lower(p.excerpt) LIKE ?1 ESCAPE '\\')
             ORDER BY p.published_at DESC, p.rowid DESC
             LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(params![like_pattern(term), limit], |row| {
                Ok(PostSearchHit {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    slug: row.get(2)?,
                    excerpt: row.get(3)?,
                    published_at: row.get(4)?,
                    category_name: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }

    async fn search_reports(&self, term: &str, limit: u32) -> Result<Vec<ReportSearchHit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, title, content, session, report_date
             FROM trading_reports
             WHERE status = 'published' AND unicode_lower(title) LIKE ?1 ESCAPE '\\'
             ORDER BY report_date DESC, rowid DESC
             LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(params![like_pattern(term), limit], |row| {
                Ok(ReportSearchHit {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    session: row.get(3)?,
                    report_date: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }
}
