//! 옵션 계약.
//!
//! 하나의 계약은 (기초자산, 만기일, 행사가, 콜/풋) 복합 키로 식별됩니다.
//! 같은 키로 다시 저장하면 이전 행을 대체합니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Ticker;

/// 옵션 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// 콜
    Call,
    /// 풋
    Put,
}

impl OptionType {
    /// DB 저장용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            _ => Err(CoreError::InvalidOptionType(s.to_string())),
        }
    }
}

/// 옵션 계약 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// 기초자산 티커
    pub symbol: Ticker,
    /// 만기일
    pub expiration_date: NaiveDate,
    /// 행사가
    pub strike: f64,
    /// 콜/풋
    pub option_type: OptionType,
    /// OCC 계약 심볼 (예: AAPL250117C00150000)
    pub contract_symbol: Option<String>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last_price: Option<f64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    /// 내재변동성 (소수, 0.25 = 25%)
    pub implied_volatility: Option<f64>,
    /// 내가격 여부
    pub in_the_money: Option<bool>,
    /// 마지막 체결 시각
    pub last_trade_date: Option<DateTime<Utc>>,
    /// 수집 시각
    pub fetched_at: DateTime<Utc>,
}

impl OptionContract {
    /// 시세 필드가 비어있는 계약을 생성합니다.
    pub fn new(
        symbol: Ticker,
        expiration_date: NaiveDate,
        strike: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            symbol,
            expiration_date,
            strike,
            option_type,
            contract_symbol: None,
            bid: None,
            ask: None,
            last_price: None,
            volume: None,
            open_interest: None,
            implied_volatility: None,
            in_the_money: None,
            last_trade_date: None,
            fetched_at: Utc::now(),
        }
    }
}
