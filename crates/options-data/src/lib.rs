//! 옵션 체인 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 데이터 소스 호출 계층 (`Transport`)과 동시성/호출 간격 제한 클라이언트
//! - Yahoo Finance 응답 스키마 및 파싱 (`YahooOptionsSource`)
//! - S&P 500 / 지수 ETF 심볼 유니버스
//! - SQLite 저장소 (`stock_info`, `options_chain` upsert)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

// Provider 재내보내기
pub use provider::{
    FetchRequest, HttpTransport, OptionsSource, RateLimitConfig, RateLimitedClient, RawResponse,
    SymbolUniverse, Transport, UniverseSelection, YahooOptionsSource,
};

// 저장소 타입 재내보내기
pub use storage::sqlite::{
    Database, DatabaseConfig, DatabaseStats, OptionContractRecord, OptionsChainRepository,
    StockInfoRecord, StockInfoRepository, UpsertReport,
};
