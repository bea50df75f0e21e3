//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 수집/저장 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 연결 수준 네트워크 오류 (일시적)
    #[error("Network error: {0}")]
    Network(String),

    /// 데이터 소스의 요청 제한 (HTTP 429)
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    /// 심볼/만기일에 해당하는 데이터 없음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 요청 타임아웃
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 예상하지 못한 데이터 소스 응답 (재시도하지 않음)
    #[error("Unexpected provider response: {0}")]
    Provider(String),

    /// 요청 취소 (종료 중)
    #[error("Request cancelled")]
    Cancelled,

    /// 로컬 저장소 쓰기/조회 오류
    #[error("Storage error: {0}")]
    Storage(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    Migration(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// 재시도 가능한 오류인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataError::Network(_) | DataError::RateLimited(_) | DataError::Timeout(_)
        )
    }

    /// 데이터 없음 오류인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db_err) => DataError::Storage(db_err.message().to_string()),
            _ => DataError::Storage(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else if err.is_builder() {
            DataError::Config(err.to_string())
        } else {
            DataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
