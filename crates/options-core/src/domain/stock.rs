//! 종목 기본 정보.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Ticker;

/// 기초자산 종목 정보.
///
/// `symbol`이 고유 키이며, 수집할 때마다 전체 필드를 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    /// 티커 (고유 키)
    pub symbol: Ticker,
    /// 회사명 (long name 우선, 없으면 short name)
    pub company_name: Option<String>,
    /// 섹터
    pub sector: Option<String>,
    /// 업종
    pub industry: Option<String>,
    /// 거래소 (예: NMS, PCX)
    pub exchange: Option<String>,
    /// 통화
    pub currency: Option<String>,
    /// 현재가
    pub current_price: Option<f64>,
    /// 시가총액
    pub market_cap: Option<f64>,
    /// 마지막 갱신 시각
    pub updated_at: DateTime<Utc>,
}

impl StockInfo {
    /// 티커만 채운 빈 종목 정보를 생성합니다.
    pub fn new(symbol: Ticker) -> Self {
        Self {
            symbol,
            company_name: None,
            sector: None,
            industry: None,
            exchange: None,
            currency: None,
            current_price: None,
            market_cap: None,
            updated_at: Utc::now(),
        }
    }

    /// 회사명을 설정합니다.
    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// 현재가를 설정합니다.
    pub fn with_current_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }
}
