use async_trait::async_trait;
use rusqlite::Connection;

use crate::commands::{like_pattern, new_id, now, search_term, validation};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Trade, TradeFilters, TradeInput};
use crate::repository::TradeRepository;

const TRADE_COLUMNS: &str = "id, platform, pair, side, entry_price, exit_price, stop_loss, take_profit,
    quantity, pnl, fee, leverage, strategy, exit_reason, notes, trade_date, report_id,
    created_at, updated_at";

/// Helper function to map a database row to a Trade struct
fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        platform: row.get(1)?,
        pair: row.get(2)?,
        side: row.get(3)?,
        entry_price: row.get(4)?,
        exit_price: row.get(5)?,
        stop_loss: row.get(6)?,
        take_profit: row.get(7)?,
        quantity: row.get(8)?,
        pnl: row.get(9)?,
        fee: row.get(10)?,
        leverage: row.get(11)?,
        strategy: row.get(12)?,
        exit_reason: row.get(13)?,
        notes: row.get(14)?,
        trade_date: row.get(15)?,
        report_id: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn load_trade(conn: &Connection, id: &str) -> Result<Trade> {
    conn.query_row(
        &format!("SELECT {} FROM trades WHERE id = ?", TRADE_COLUMNS),
        [id],
        map_row_to_trade,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("trade {}", id)),
        other => other.into(),
    })
}

fn query_trades<P: rusqlite::Params>(conn: &Connection, query: &str, params: P) -> Result<Vec<Trade>> {
    let mut stmt = conn.prepare(query)?;
    let trades = stmt
        .query_map(params, map_row_to_trade)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(trades)
}

/// Blank optional text fields are stored as NULL
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl TradeRepository for Database {
    async fn list_trades(&self, filters: TradeFilters) -> Result<Vec<Trade>> {
        let conn = self.conn()?;

        let mut query = format!("SELECT {} FROM trades WHERE 1=1", TRADE_COLUMNS);
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(side) = filters.side {
            conditions.push("side = ?");
            params.push(Box::new(side));
        }
        if let Some(term) = search_term(&filters.search) {
            conditions.push(
                "(unicode_lower(pair) LIKE ? ESCAPE '\\' OR unicode_lower(platform) LIKE ? ESCAPE '\\'
                  OR unicode_lower(strategy) LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(term);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }
        if let Some(report_id) = &filters.report_id {
            conditions.push("report_id = ?");
            params.push(Box::new(report_id.clone()));
        }
        if let Some(start_date) = filters.start_date {
            conditions.push("trade_date >= ?");
            params.push(Box::new(start_date));
        }
        if let Some(end_date) = filters.end_date {
            conditions.push("trade_date <= ?");
            params.push(Box::new(end_date));
        }

        if !conditions.is_empty() {
            query.push_str(&format!(" AND {}", conditions.join(" AND ")));
        }
        query.push_str(" ORDER BY trade_date DESC, rowid DESC");

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        query_trades(&conn, &query, param_refs.as_slice())
    }

    async fn trades_since(&self, since: Option<i64>) -> Result<Vec<Trade>> {
        let conn = self.conn()?;
        match since {
            Some(threshold) => query_trades(
                &conn,
                &format!(
                    "SELECT {} FROM trades WHERE trade_date >= ? ORDER BY trade_date ASC, rowid ASC",
                    TRADE_COLUMNS
                ),
                [threshold],
            ),
            None => query_trades(
                &conn,
                &format!("SELECT {} FROM trades ORDER BY trade_date ASC, rowid ASC", TRADE_COLUMNS),
                [],
            ),
        }
    }

    async fn trades_for_report(&self, report_id: &str) -> Result<Vec<Trade>> {
        let conn = self.conn()?;
        query_trades(
            &conn,
            &format!(
                "SELECT {} FROM trades WHERE report_id = ? ORDER BY trade_date ASC, rowid ASC",
                TRADE_COLUMNS
            ),
            [report_id],
        )
    }

    async fn get_trade(&self, id: &str) -> Result<Trade> {
        let conn = self.conn()?;
        load_trade(&conn, id)
    }

    async fn create_trade(&self, trade: TradeInput) -> Result<Trade> {
        validation(trade.validate())?;
        let conn = self.conn()?;

        let id = new_id("TRADE");
        let now = now();

        conn.execute(
            "INSERT INTO trades (
                id, platform, pair, side, entry_price, exit_price, stop_loss, take_profit,
                quantity, pnl, fee, leverage, strategy, exit_reason, notes, trade_date, report_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                id, non_blank(&trade.platform), trade.pair.trim(), trade.side, trade.entry_price,
                trade.exit_price, trade.stop_loss, trade.take_profit, trade.quantity, trade.pnl,
                trade.fee, trade.leverage, non_blank(&trade.strategy), non_blank(&trade.exit_reason),
                non_blank(&trade.notes), trade.trade_date, non_blank(&trade.report_id), now, now
            ],
        )?;

        load_trade(&conn, &id)
    }

    async fn update_trade(&self, id: &str, trade: TradeInput) -> Result<Trade> {
        validation(trade.validate())?;
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE trades SET
                platform = ?, pair = ?, side = ?, entry_price = ?, exit_price = ?, stop_loss = ?,
                take_profit = ?, quantity = ?, pnl = ?, fee = ?, leverage = ?, strategy = ?,
                exit_reason = ?, notes = ?, trade_date = ?, report_id = ?, updated_at = ?
             WHERE id = ?",
            rusqlite::params![
                non_blank(&trade.platform), trade.pair.trim(), trade.side, trade.entry_price,
                trade.exit_price, trade.stop_loss, trade.take_profit, trade.quantity, trade.pnl,
                trade.fee, trade.leverage, non_blank(&trade.strategy), non_blank(&trade.exit_reason),
                non_blank(&trade.notes), trade.trade_date, non_blank(&trade.report_id), now(), id
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("trade {}", id)));
        }

        load_trade(&conn, id)
    }

    async fn delete_trade(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM trades WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("trade {}", id)));
        }
        Ok(())
    }
}
