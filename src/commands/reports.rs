use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::commands::{like_pattern, new_id, now, page_offset, search_term, validation};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Page, PublishStatus, ReportFilters, ReportInput, TradingReport};
use crate::repository::ReportRepository;

const REPORT_COLUMNS: &str =
    "id, title, content, session, report_date, status, created_at, updated_at";

fn map_row_to_report(row: &rusqlite::Row) -> rusqlite::Result<TradingReport> {
    Ok(TradingReport {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        session: row.get(3)?,
        report_date: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn load_report(conn: &Connection, id: &str) -> Result<TradingReport> {
    conn.query_row(
        &format!("SELECT {} FROM trading_reports WHERE id = ?", REPORT_COLUMNS),
        [id],
        map_row_to_report,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("report {}", id)))
}

fn query_reports<P: rusqlite::Params>(conn: &Connection, query: &str, params: P) -> Result<Vec<TradingReport>> {
    let mut stmt = conn.prepare(query)?;
    let reports = stmt
        .query_map(params, map_row_to_report)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reports)
}

#[async_trait]
impl ReportRepository for Database {
    async fn list_reports(&self, filters: ReportFilters) -> Result<Vec<TradingReport>> {
        let conn = self.conn()?;

        let mut query = format!("SELECT {} FROM trading_reports WHERE 1=1", REPORT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filters.status {
            query.push_str(" AND status = ?");
            params.push(Box::new(status));
        }
        if let Some(session) = search_term(&filters.session) {
            query.push_str(" AND session = ?");
            params.push(Box::new(session.to_string()));
        }
        if let Some(term) = search_term(&filters.search) {
            query.push_str(" AND unicode_lower(title) LIKE ? ESCAPE '\\'");
            params.push(Box::new(like_pattern(term)));
        }
        query.push_str(" ORDER BY report_date DESC, rowid DESC");

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        query_reports(&conn, &query, param_refs.as_slice())
    }

    async fn list_published_reports(
        &self,
        page: u32,
        page_size: u32,
        session: Option<String>,
    ) -> Result<Page<TradingReport>> {
        let conn = self.conn()?;
        let offset = page_offset(page, page_size);

        let (total, data) = match search_term(&session) {
            Some(session) => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM trading_reports WHERE status = 'published' AND session = ?",
                    [session],
                    |row| row.get(0),
                )?;
                let data = query_reports(
                    &conn,
                    &format!(
                        "SELECT {} FROM trading_reports WHERE status = 'published' AND session = ?
                         ORDER BY report_date DESC, rowid DESC LIMIT ? OFFSET ?",
                        REPORT_COLUMNS
                    ),
                    params![session, page_size, offset],
                )?;
                (total, data)
            }
            None => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM trading_reports WHERE status = 'published'",
                    [],
                    |row| row.get(0),
                )?;
                let data = query_reports(
                    &conn,
                    &format!(
                        "SELECT {} FROM trading_reports WHERE status = 'published'
                         ORDER BY report_date DESC, rowid DESC LIMIT ? OFFSET ?",
                        REPORT_COLUMNS
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

    async fn get_report(&self, id: &str) -> Result<TradingReport> {
        let conn = self.conn()?;
        load_report(&conn, id)
    }

    async fn get_published_report(&self, id: &str) -> Result<TradingReport> {
        let conn = self.conn()?;
        let report = load_report(&conn, id)?;
        if report.status != PublishStatus::Published {
            return Err(AppError::NotFound(format!("report {}", id)));
        }
        Ok(report)
    }

    async fn save_report(
        &self,
        id: Option<String>,
        report: ReportInput,
        status: PublishStatus,
    ) -> Result<TradingReport> {
        validation(report.validate())?;
        let conn = self.conn()?;
        let now = now();
        let session = report.session.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let id = match id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE trading_reports SET
                        title = ?, content = ?, session = ?, report_date = ?, status = ?, updated_at = ?
                     WHERE id = ?",
                    params![report.title.trim(), report.content, session, report.report_date, status, now, id],
                )?;
                if changed == 0 {
                    return Err(AppError::NotFound(format!("report {}", id)));
                }
                id
            }
            None => {
                let id = new_id("REPORT");
                conn.execute(
                    &format!("INSERT INTO trading_reports ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)", REPORT_COLUMNS),
                    params![id, report.title.trim(), report.content, session, report.report_date, status, now, now],
                )?;
                id
            }
        };

        load_report(&conn, &id)
    }

    async fn delete_report(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        // Linked trades stay in the journal with report_id cleared
        let deleted = conn.execute("DELETE FROM trading_reports WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("report {}", id)));
        }
        log::info!("Deleted trading report {}", id);
        Ok(())
    }

    async fn toggle_report_status(&self, id: &str) -> Result<TradingReport> {
        let conn = self.conn()?;
        let current = load_report(&conn, id)?;
        conn.execute(
            "UPDATE trading_reports SET status = ?, updated_at = ? WHERE id = ?",
            params![current.status.toggled(), now(), id],
        )?;
        load_report(&conn, id)
    }
}
