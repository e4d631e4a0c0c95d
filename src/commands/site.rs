use async_trait::async_trait;

use crate::commands::now;
use crate::db::Database;
use crate::error::Result;
use crate::models::{AdminOverview, ChangeFrequency, SitemapEntry};
use crate::repository::SiteRepository;

/// Public listing pages, always present in the sitemap
const STATIC_PAGES: [(&str, ChangeFrequency, f64); 4] = [
    ("", ChangeFrequency::Daily, 1.0),
    ("/posts", ChangeFrequency::Daily, 0.9),
    ("/trading-reports", ChangeFrequency::Daily, 0.9),
    ("/trading-dashboard", ChangeFrequency::Weekly, 0.7),
];

#[async_trait]
impl SiteRepository for Database {
    async fn admin_overview(&self) -> Result<AdminOverview> {
        let conn = self.conn()?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        };

        Ok(AdminOverview {
            posts: count("posts")?,
            reports: count("trading_reports")?,
            trades: count("trades")?,
            categories: count("categories")?,
        })
    }

    async fn sitemap_entries(&self, site_url: &str) -> Result<Vec<SitemapEntry>> {
        let root = site_url.trim_end_matches('/');
        let generated_at = now();

        let mut entries: Vec<SitemapEntry> = STATIC_PAGES
            .iter()
            .map(|(path, change_frequency, priority)| SitemapEntry {
                url: format!("{}{}", root, path),
                last_modified: generated_at,
                change_frequency: *change_frequency,
                priority: *priority,
            })
            .collect();

        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT slug, updated_at FROM posts
             WHERE status = 'published'
             ORDER BY published_at DESC, rowid DESC",
        )?;
        let posts = stmt
            .query_map([], |row| {
                Ok(SitemapEntry {
                    url: format!("{}/posts/{}", root, row.get::<_, String>(0)?),
                    last_modified: row.get(1)?,
                    change_frequency: ChangeFrequency::Weekly,
                    priority: 0.8,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        entries.extend(posts);

        let mut stmt = conn.prepare(
            "SELECT id, updated_at FROM trading_reports
             WHERE status = 'published'
             ORDER BY report_date DESC, rowid DESC",
        )?;
        let reports = stmt
            .query_map([], |row| {
                Ok(SitemapEntry {
                    url: format!("{}/trading-reports/{}", root, row.get::<_, String>(0)?),
                    last_modified: row.get(1)?,
                    change_frequency: ChangeFrequency::Monthly,
                    priority: 0.7,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        entries.extend(reports);

        log::debug!("Sitemap built with {} entries", entries.len());
        Ok(entries)
    }
}
