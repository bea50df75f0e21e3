//! 데이터 Provider 모듈.
//!
//! ## 호출 계층
//! - `Transport`: 요청 하나를 외부 소스에 보내고 원시 응답을 돌려주는 trait
//! - `HttpTransport`: reqwest 기반 Yahoo Finance HTTP 구현
//! - `RateLimitedClient`: 임의의 `Transport`를 감싸 동시 요청 수, 요청 시작 간격,
//!   타임아웃, 재시도(지수 백오프)를 적용
//!
//! ## 소스
//! - `OptionsSource`: 종목 정보 / 만기일 목록 / 만기별 옵션 체인 조회 trait
//! - `YahooOptionsSource`: Yahoo Finance 응답을 타입이 있는 스키마로 파싱
//!
//! ## 심볼 유니버스
//! - `SymbolUniverse`: Wikipedia S&P 500 구성 종목 + 지수 ETF 목록

pub mod rate_limit;
pub mod transport;
pub mod universe;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use options_core::{OptionContract, StockInfo, Ticker};

use crate::error::Result;

pub use rate_limit::{RateLimitConfig, RateLimitedClient};
pub use transport::{FetchRequest, HttpTransport, RawResponse, Transport};
pub use universe::{SymbolUniverse, UniverseSelection, INDEX_ETFS};
pub use yahoo::YahooOptionsSource;

/// 옵션 체인 데이터 소스 trait.
#[async_trait]
pub trait OptionsSource: Send + Sync {
    /// 소스 이름.
    fn name(&self) -> &str;

    /// 종목 기본 정보 조회.
    async fn stock_info(&self, symbol: &Ticker) -> Result<StockInfo>;

    /// 사용 가능한 만기일 목록 조회 (정렬 보장 없음).
    async fn expirations(&self, symbol: &Ticker) -> Result<Vec<NaiveDate>>;

    /// 특정 만기일의 옵션 체인 (콜 + 풋) 조회.
    async fn option_chain(
        &self,
        symbol: &Ticker,
        expiration: NaiveDate,
    ) -> Result<Vec<OptionContract>>;
}
