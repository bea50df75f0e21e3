//! # Options Core
//!
//! 옵션 체인 수집기의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집기 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목 기본 정보 (`StockInfo`)
//! - 옵션 계약 및 복합 키 (`OptionContract`)
//! - 티커 정규화 (`Ticker`)
//! - 만기일 선택 규칙
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
