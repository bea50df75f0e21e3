//! Standalone options chain collector.
//!
//! 이 crate는 옵션 체인을 수집하는 바이너리와 라이브러리를 제공합니다:
//! - 심볼 유니버스 결정 (S&P 500, 지수 ETF, 직접 지정)
//! - 종목 정보 + 만기별 옵션 체인 동시 수집
//! - SQLite 저장 및 통계 조회

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, ConfigOverrides};
pub use error::{CollectorError, Result};
pub use modules::{collect_options, OptionsCollector};
pub use stats::CollectionStats;
