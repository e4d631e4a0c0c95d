use crate::db::Database;
use crate::models::{Trade, TradeInput, TradeSide};

/// 2024-03-01 00:00:00 UTC
pub const DAY_ONE: i64 = 1_709_251_200;
pub const DAY: i64 = 86_400;

/// Create a trade with only the fields the statistics look at filled in.
pub fn make_trade(id: &str, pair: &str, side: TradeSide, pnl: f64, trade_date: i64) -> Trade {
    Trade {
        id: id.to_string(),
        platform: None,
        pair: pair.to_string(),
        side,
        entry_price: 100.0,
        exit_price: None,
        stop_loss: None,
        take_profit: None,
        quantity: 1.0,
        pnl,
        fee: 0.0,
        leverage: 1,
        strategy: None,
        exit_reason: None,
        notes: None,
        trade_date,
        report_id: None,
        created_at: trade_date,
        updated_at: trade_date,
    }
}

/// Create a valid trade input for the store.
pub fn make_trade_input(pair: &str, side: TradeSide, pnl: f64, trade_date: i64) -> TradeInput {
    TradeInput {
        platform: Some("Binance".to_string()),
        pair: pair.to_string(),
        side,
        entry_price: 100.0,
        exit_price: Some(101.0),
        stop_loss: Some(95.0),
        take_profit: None,
        quantity: 1.0,
        pnl,
        fee: 0.0,
        leverage: 1,
        strategy: None,
        exit_reason: None,
        notes: None,
        trade_date,
        report_id: None,
    }
}

/// Fresh in-memory store with every migration applied.
pub fn test_db() -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    Database::open_in_memory().expect("in-memory database")
}
