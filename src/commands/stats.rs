use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Trade, TradingReport};
use crate::repository::{ReportRepository, TradeRepository};
use crate::stats::{aggregate, recent_trades, ReportSummary, TimeRange, TradingStats};

/// Trades shown under the dashboard charts
pub const RECENT_TRADES_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub range: TimeRange,
    pub stats: TradingStats,
    pub recent_trades: Vec<Trade>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetail {
    pub report: TradingReport,
    pub trades: Vec<Trade>,
    pub summary: ReportSummary,
}

/// Dashboard figures for the trades inside `range`, measured back from `now`
pub async fn get_dashboard_stats<R>(trades: &R, range: TimeRange, now: DateTime<Utc>) -> Result<DashboardStats>
where
    R: TradeRepository + ?Sized,
{
    let since = range.since(now);
    let trades = trades.trades_since(since).await?;
    log::debug!("Aggregating {} trades for range {}", trades.len(), range);

    Ok(DashboardStats {
        range,
        stats: aggregate(&trades),
        recent_trades: recent_trades(&trades, RECENT_TRADES_LIMIT),
    })
}

/// A published report with its linked trades and their totals
pub async fn get_report_detail<R, T>(reports: &R, trades: &T, id: &str) -> Result<ReportDetail>
where
    R: ReportRepository + ?Sized,
    T: TradeRepository + ?Sized,
{
    let report = reports.get_published_report(id).await?;
    let trades = trades.trades_for_report(&report.id).await?;
    let summary = ReportSummary::from_trades(&trades);

    Ok(ReportDetail { report, trades, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{PublishStatus, ReportInput, TradeSide};
    use crate::test_helpers::{make_trade_input, test_db, DAY, DAY_ONE};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_dashboard_respects_range() {
        let db = test_db();
        let now = Utc.timestamp_opt(DAY_ONE + 40 * DAY, 0).unwrap();

        // 35 days old: outside 30d, inside 90d
        db.create_trade(make_trade_input("BTCUSDT", TradeSide::Long, 100.0, DAY_ONE + 5 * DAY))
            .await
            .unwrap();
        db.create_trade(make_trade_input("ETHUSDT", TradeSide::Short, -40.0, DAY_ONE + 35 * DAY))
            .await
            .unwrap();
        db.create_trade(make_trade_input("BTCUSDT", TradeSide::Long, 60.0, DAY_ONE + 39 * DAY))
            .await
            .unwrap();

        let month = get_dashboard_stats(&db, TimeRange::Last30Days, now).await.unwrap();
        assert_eq!(month.stats.total_trades, 2);
        assert_eq!(month.stats.total_pnl, 20.0);
        assert_eq!(month.recent_trades[0].pnl, 60.0);

        let all = get_dashboard_stats(&db, TimeRange::All, now).await.unwrap();
        assert_eq!(all.stats.total_trades, 3);
        assert_eq!(all.stats.cumulative.last().unwrap().cumulative_pnl, 120.0);
    }

    #[tokio::test]
    async fn test_dashboard_empty_journal() {
        let db = test_db();
        let stats = get_dashboard_stats(&db, TimeRange::Last7Days, Utc::now()).await.unwrap();
        assert_eq!(stats.stats.total_trades, 0);
        assert!(stats.recent_trades.is_empty());
    }

    #[tokio::test]
    async fn test_report_detail() {
        let db = test_db();
        let report = db
            .save_report(
                None,
                ReportInput {
                    title: "Phiên London".to_string(),
                    content: String::new(),
                    session: Some("SS2".to_string()),
                    report_date: "2024-03-01".to_string(),
                },
                PublishStatus::Published,
            )
            .await
            .unwrap();
        for pnl in [30.0, -10.0] {
            let mut input = make_trade_input("XAUUSD", TradeSide::Long, pnl, DAY_ONE);
            input.report_id = Some(report.id.clone());
            db.create_trade(input).await.unwrap();
        }
        db.create_trade(make_trade_input("XAUUSD", TradeSide::Long, 999.0, DAY_ONE))
            .await
            .unwrap();

        let detail = get_report_detail(&db, &db, &report.id).await.unwrap();
        assert_eq!(detail.trades.len(), 2);
        assert_eq!(detail.summary.total_pnl, 20.0);
        assert_eq!(detail.summary.wins, 1);
        assert_eq!(detail.summary.losses, 1);
    }

    #[tokio::test]
    async fn test_report_detail_hides_drafts() {
        let db = test_db();
        let report = db
            .save_report(
                None,
                ReportInput {
                    title: "Nháp".to_string(),
                    content: String::new(),
                    session: None,
                    report_date: "2024-03-01".to_string(),
                },
                PublishStatus::Draft,
            )
            .await
            .unwrap();

        let result = get_report_detail(&db, &db, &report.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
