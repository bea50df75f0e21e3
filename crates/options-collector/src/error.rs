//! 에러 타입 정의.

use options_data::DataError;
use std::fmt;

/// Collector 에러 타입
///
/// 시작 단계(설정, DB 열기, 심볼 유니버스 조회) 실패만 이 타입으로 전파됩니다.
/// 수집 중 개별 요청 실패는 통계에 집계됩니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 데이터베이스 에러 (연결, 마이그레이션, 조회)
    Database(DataError),
    /// 데이터 소스 에러 (Yahoo, Wikipedia)
    DataSource(DataError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::DataSource(e) => write!(f, "Data source error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) | Self::DataSource(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Config(msg) => Self::Config(msg),
            DataError::Connection(_) | DataError::Migration(_) | DataError::Storage(_) => {
                Self::Database(err)
            }
            _ => Self::DataSource(err),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
