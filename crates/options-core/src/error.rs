//! 도메인 타입 에러.

use thiserror::Error;

/// 도메인 값 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 잘못된 티커
    #[error("잘못된 티커: {0:?}")]
    InvalidTicker(String),

    /// 알 수 없는 옵션 유형
    #[error("알 수 없는 옵션 유형: {0}")]
    InvalidOptionType(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
