use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::models::{Trade, TradeSide};

/// Average win over average loss.
///
/// `Unbounded` is a set with winners and no losers; it is kept apart from
/// finite values so it can be shown as "∞" rather than a huge number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ProfitFactor {
    Finite(f64),
    Unbounded,
}

impl ProfitFactor {
    fn from_averages(avg_win: f64, avg_loss: f64) -> Self {
        if avg_loss > 0.0 {
            ProfitFactor::Finite(avg_win / avg_loss)
        } else if avg_win > 0.0 {
            ProfitFactor::Unbounded
        } else {
            ProfitFactor::Finite(0.0)
        }
    }

    pub fn is_profitable(&self) -> bool {
        match self {
            ProfitFactor::Finite(v) => *v >= 1.0,
            ProfitFactor::Unbounded => true,
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{:.2}", v),
            ProfitFactor::Unbounded => f.write_str("∞"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExtreme {
    pub id: String,
    pub pair: String,
    pub pnl: f64,
}

impl From<&Trade> for TradeExtreme {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id.clone(),
            pair: trade.pair.clone(),
            pnl: trade.pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub pair: String,
    pub count: usize,
    pub pnl: f64,
    pub wins: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub count: usize,
    pub pnl: f64,
    pub wins: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: String,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingStats {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub total_fees: f64,
    pub net_pnl: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: ProfitFactor,
    pub best_trade: Option<TradeExtreme>,
    pub worst_trade: Option<TradeExtreme>,
    pub pairs: Vec<PairStats>,
    pub long: SideStats,
    pub short: SideStats,
    pub cumulative: Vec<CumulativePoint>,
}

/// Percentage of `wins` in `count`, 0 for an empty set
fn rate(wins: usize, count: usize) -> f64 {
    if count > 0 {
        (wins as f64 / count as f64) * 100.0
    } else {
        0.0
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { 0.0 }
}

/// Date portion (UTC, `YYYY-MM-DD`) of a trade timestamp
pub fn day_key(timestamp: i64) -> String {
    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "unknown".to_string(),
    }
}

/// Compute dashboard statistics over an already-filtered set of trades.
///
/// Wins are `pnl > 0`, losses `pnl < 0`; break-even trades count toward
/// the total (and so dilute the win rate) but toward neither side.
pub fn aggregate(trades: &[Trade]) -> TradingStats {
    let mut total_pnl = 0.0;
    let mut total_fees = 0.0;
    let mut win_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut wins = 0;
    let mut losses = 0;
    let mut best: Option<&Trade> = None;
    let mut worst: Option<&Trade> = None;

    let mut pairs: Vec<PairStats> = Vec::new();
    let mut pair_index: HashMap<&str, usize> = HashMap::new();
    let mut long = SideStats::default();
    let mut short = SideStats::default();
    let mut daily: HashMap<String, (f64, usize)> = HashMap::new();

    for trade in trades {
        let is_win = trade.pnl > 0.0;

        total_pnl += trade.pnl;
        total_fees += trade.fee;
        if is_win {
            wins += 1;
            win_sum += trade.pnl;
        } else if trade.pnl < 0.0 {
            losses += 1;
            loss_sum += trade.pnl.abs();
        }

        // Strict comparisons keep the first occurrence on ties
        if best.is_none_or(|b| trade.pnl > b.pnl) {
            best = Some(trade);
        }
        if worst.is_none_or(|w| trade.pnl < w.pnl) {
            worst = Some(trade);
        }

        let idx = *pair_index.entry(trade.pair.as_str()).or_insert_with(|| {
            pairs.push(PairStats {
                pair: trade.pair.clone(),
                count: 0,
                pnl: 0.0,
                wins: 0,
                win_rate: 0.0,
            });
            pairs.len() - 1
        });
        let pair = &mut pairs[idx];
        pair.count += 1;
        pair.pnl += trade.pnl;
        if is_win {
            pair.wins += 1;
        }

        let side = match trade.side {
            TradeSide::Long => &mut long,
            TradeSide::Short => &mut short,
        };
        side.count += 1;
        side.pnl += trade.pnl;
        if is_win {
            side.wins += 1;
        }

        let entry = daily.entry(day_key(trade.trade_date)).or_insert((0.0, 0));
        entry.0 += trade.pnl;
        entry.1 += 1;
    }

    for pair in pairs.iter_mut() {
        pair.win_rate = rate(pair.wins, pair.count);
    }
    pairs.sort_by(|a, b| b.pnl.total_cmp(&a.pnl));

    long.win_rate = rate(long.wins, long.count);
    short.win_rate = rate(short.wins, short.count);

    let avg_win = mean(win_sum, wins);
    let avg_loss = mean(loss_sum, losses);

    TradingStats {
        total_trades: trades.len(),
        total_pnl,
        total_fees,
        net_pnl: total_pnl - total_fees,
        wins,
        losses,
        win_rate: rate(wins, trades.len()),
        avg_win,
        avg_loss,
        profit_factor: ProfitFactor::from_averages(avg_win, avg_loss),
        best_trade: best.map(TradeExtreme::from),
        worst_trade: worst.map(TradeExtreme::from),
        pairs,
        long,
        short,
        cumulative: cumulative_series(daily),
    }
}

fn cumulative_series(daily: HashMap<String, (f64, usize)>) -> Vec<CumulativePoint> {
    let mut days: Vec<_> = daily.into_iter().collect();
    days.sort_by(|a, b| a.0.cmp(&b.0));

    let mut cumulative_pnl = 0.0;
    days.into_iter()
        .map(|(date, (daily_pnl, trade_count))| {
            cumulative_pnl += daily_pnl;
            CumulativePoint {
                date,
                daily_pnl,
                cumulative_pnl,
                trade_count,
            }
        })
        .collect()
}

/// The `n` most recent trades, newest first
pub fn recent_trades(trades: &[Trade], n: usize) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
    sorted.truncate(n);
    sorted
}

/// Totals shown at the top of a trading report page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub trade_count: usize,
    pub total_pnl: f64,
    pub wins: usize,
    pub losses: usize,
}

impl ReportSummary {
    pub fn from_trades(trades: &[Trade]) -> Self {
        trades.iter().fold(Self::default(), |mut acc, t| {
            acc.trade_count += 1;
            acc.total_pnl += t.pnl;
            if t.pnl > 0.0 {
                acc.wins += 1;
            } else if t.pnl < 0.0 {
                acc.losses += 1;
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_trade as trade, DAY, DAY_ONE};

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.profit_factor, ProfitFactor::Finite(0.0));
        assert_eq!(stats.total_pnl, 0.0);
        assert_eq!(stats.net_pnl, 0.0);
        assert_eq!(stats.avg_win, 0.0);
        assert_eq!(stats.avg_loss, 0.0);
        assert!(stats.best_trade.is_none());
        assert!(stats.worst_trade.is_none());
        assert!(stats.pairs.is_empty());
        assert!(stats.cumulative.is_empty());
        assert_eq!(stats.long, SideStats::default());
    }

    #[test]
    fn test_basic_totals() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 10.0, DAY_ONE),
            trade("b", "BTC", TradeSide::Long, -5.0, DAY_ONE),
            trade("c", "ETH", TradeSide::Short, 20.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.total_pnl, 25.0);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate - 66.666_666).abs() < 1e-4);
        assert_eq!(stats.best_trade.as_ref().unwrap().pnl, 20.0);
        assert_eq!(stats.worst_trade.as_ref().unwrap().pnl, -5.0);
        assert_eq!(stats.avg_win, 15.0);
        assert_eq!(stats.avg_loss, 5.0);
        assert_eq!(stats.profit_factor, ProfitFactor::Finite(3.0));
    }

    #[test]
    fn test_fees_reduce_net() {
        let mut a = trade("a", "BTC", TradeSide::Long, 10.0, DAY_ONE);
        a.fee = 1.5;
        let mut b = trade("b", "BTC", TradeSide::Long, 4.0, DAY_ONE);
        b.fee = 0.5;
        let stats = aggregate(&[a, b]);

        assert_eq!(stats.total_fees, 2.0);
        assert_eq!(stats.net_pnl, 12.0);
    }

    #[test]
    fn test_break_even_counts_toward_total_only() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 10.0, DAY_ONE),
            trade("b", "BTC", TradeSide::Long, 0.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.win_rate, 50.0);
    }

    #[test]
    fn test_all_winners_profit_factor_unbounded() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 10.0, DAY_ONE),
            trade("b", "ETH", TradeSide::Long, 3.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.profit_factor, ProfitFactor::Unbounded);
        assert_eq!(stats.profit_factor.to_string(), "∞");
        assert!(stats.profit_factor.is_profitable());
    }

    #[test]
    fn test_only_break_even_profit_factor_zero() {
        let stats = aggregate(&[trade("a", "BTC", TradeSide::Long, 0.0, DAY_ONE)]);
        assert_eq!(stats.profit_factor, ProfitFactor::Finite(0.0));
        assert_eq!(stats.profit_factor.to_string(), "0.00");
    }

    #[test]
    fn test_extremes_keep_first_on_ties() {
        let trades = vec![
            trade("first", "BTC", TradeSide::Long, 7.0, DAY_ONE),
            trade("second", "ETH", TradeSide::Long, 7.0, DAY_ONE),
            trade("low1", "XAU", TradeSide::Short, -3.0, DAY_ONE),
            trade("low2", "XAU", TradeSide::Short, -3.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.best_trade.unwrap().id, "first");
        assert_eq!(stats.worst_trade.unwrap().id, "low1");
    }

    #[test]
    fn test_pair_breakdown_sorted_by_pnl() {
        let trades = vec![
            trade("a", "ETH", TradeSide::Long, 3.0, DAY_ONE),
            trade("b", "BTC", TradeSide::Long, 10.0, DAY_ONE),
            trade("c", "BTC", TradeSide::Short, -5.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.pairs.len(), 2);
        let btc = &stats.pairs[0];
        assert_eq!(btc.pair, "BTC");
        assert_eq!(btc.count, 2);
        assert_eq!(btc.pnl, 5.0);
        assert_eq!(btc.wins, 1);
        assert_eq!(btc.win_rate, 50.0);
        assert_eq!(stats.pairs[1].pair, "ETH");
        assert_eq!(stats.pairs[1].win_rate, 100.0);
    }

    #[test]
    fn test_long_short_partitions() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 10.0, DAY_ONE),
            trade("b", "BTC", TradeSide::Long, -4.0, DAY_ONE),
            trade("c", "BTC", TradeSide::Long, 2.0, DAY_ONE),
        ];
        let stats = aggregate(&trades);

        assert_eq!(stats.long.count, 3);
        assert_eq!(stats.long.pnl, 8.0);
        assert!((stats.long.win_rate - 66.666_666).abs() < 1e-4);
        assert_eq!(stats.short, SideStats::default());
    }

    #[test]
    fn test_cumulative_series() {
        // Out of order input, with sub-day times that must be discarded
        let trades = vec![
            trade("c", "BTC", TradeSide::Long, 8.0, DAY_ONE + 2 * DAY + 3_600),
            trade("a", "BTC", TradeSide::Long, 2.0, DAY_ONE + 60),
            trade("b", "ETH", TradeSide::Short, -2.0, DAY_ONE + DAY + 7_200),
            trade("a2", "ETH", TradeSide::Long, 3.0, DAY_ONE + 80_000),
        ];
        let stats = aggregate(&trades);

        let dates: Vec<&str> = stats.cumulative.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);

        let daily: Vec<f64> = stats.cumulative.iter().map(|p| p.daily_pnl).collect();
        assert_eq!(daily, vec![5.0, -2.0, 8.0]);

        let cumulative: Vec<f64> = stats.cumulative.iter().map(|p| p.cumulative_pnl).collect();
        assert_eq!(cumulative, vec![5.0, 3.0, 11.0]);

        assert_eq!(stats.cumulative[0].trade_count, 2);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 1.25, DAY_ONE),
            trade("b", "ETH", TradeSide::Short, -0.75, DAY_ONE + DAY),
        ];
        assert_eq!(aggregate(&trades), aggregate(&trades));
    }

    #[test]
    fn test_total_pnl_is_plain_sum() {
        let values = [0.1, 0.2, 0.3, -0.15, 1e-9];
        let trades: Vec<Trade> = values
            .iter()
            .enumerate()
            .map(|(i, v)| trade(&i.to_string(), "BTC", TradeSide::Long, *v, DAY_ONE))
            .collect();
        let expected = values.iter().fold(0.0, |acc, v| acc + v);
        assert_eq!(aggregate(&trades).total_pnl, expected);
    }

    #[test]
    fn test_recent_trades() {
        let trades = vec![
            trade("old", "BTC", TradeSide::Long, 1.0, DAY_ONE),
            trade("new", "BTC", TradeSide::Long, 1.0, DAY_ONE + 2 * DAY),
            trade("mid", "BTC", TradeSide::Long, 1.0, DAY_ONE + DAY),
        ];
        let recent = recent_trades(&trades, 2);
        let ids: Vec<&str> = recent.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    #[test]
    fn test_report_summary() {
        let trades = vec![
            trade("a", "BTC", TradeSide::Long, 12.0, DAY_ONE),
            trade("b", "BTC", TradeSide::Long, -2.0, DAY_ONE),
            trade("c", "BTC", TradeSide::Long, 0.0, DAY_ONE),
        ];
        let summary = ReportSummary::from_trades(&trades);
        assert_eq!(summary.trade_count, 3);
        assert_eq!(summary.total_pnl, 10.0);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 1);
    }
}
