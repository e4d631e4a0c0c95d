use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(TradeSide::Long),
            "short" => Ok(TradeSide::Short),
            other => Err(format!("unknown trade side: {}", other)),
        }
    }
}

impl ToSql for TradeSide {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TradeSide {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub platform: Option<String>,
    pub pair: String,
    pub side: TradeSide,

    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub quantity: f64,

    pub pnl: f64,
    pub fee: f64,
    pub leverage: i32,

    pub strategy: Option<String>,
    pub exit_reason: Option<String>,
    pub notes: Option<String>,

    pub trade_date: i64,
    pub report_id: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields accepted when creating or editing a trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub platform: Option<String>,
    pub pair: String,
    pub side: TradeSide,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub quantity: f64,
    #[serde(default)]
    pub pnl: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default = "default_leverage")]
    pub leverage: i32,
    pub strategy: Option<String>,
    pub exit_reason: Option<String>,
    pub notes: Option<String>,
    pub trade_date: i64,
    pub report_id: Option<String>,
}

fn default_leverage() -> i32 {
    1
}

impl TradeInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.pair.trim().is_empty() {
            return Err("pair is required".to_string());
        }
        if !(self.entry_price > 0.0) {
            return Err("entry price must be positive".to_string());
        }
        if !(self.quantity > 0.0) {
            return Err("quantity must be positive".to_string());
        }
        if self.leverage < 1 {
            return Err("leverage must be at least 1".to_string());
        }
        if !self.pnl.is_finite() || !self.fee.is_finite() {
            return Err("pnl and fee must be finite numbers".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeFilters {
    pub side: Option<TradeSide>,
    pub search: Option<String>,
    pub report_id: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TradeInput {
        TradeInput {
            platform: Some("Binance".to_string()),
            pair: "BTC".to_string(),
            side: TradeSide::Long,
            entry_price: 65000.0,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            quantity: 0.1,
            pnl: 0.0,
            fee: 0.0,
            leverage: 1,
            strategy: None,
            exit_reason: None,
            notes: None,
            trade_date: 1_700_000_000,
            report_id: None,
        }
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("long".parse::<TradeSide>().unwrap(), TradeSide::Long);
        assert_eq!("SHORT".parse::<TradeSide>().unwrap(), TradeSide::Short);
        assert!("flat".parse::<TradeSide>().is_err());
    }

    #[test]
    fn test_side_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TradeSide::Short).unwrap(), "\"short\"");
    }

    #[test]
    fn test_input_defaults_from_json() {
        let json = r#"{"pair":"ETH","side":"short","entry_price":3000,"quantity":1,"trade_date":0,
            "platform":null,"exit_price":null,"stop_loss":null,"take_profit":null,
            "strategy":null,"exit_reason":null,"notes":null,"report_id":null}"#;
        let parsed: TradeInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.leverage, 1);
        assert_eq!(parsed.fee, 0.0);
        assert_eq!(parsed.pnl, 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.pair = "  ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.quantity = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.leverage = 0;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.entry_price = f64::NAN;
        assert!(bad.validate().is_err());
    }
}
