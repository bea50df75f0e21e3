//! 티커 정규화.
//!
//! 입력 소스(CLI, Wikipedia, ETF 목록)마다 표기가 조금씩 다르므로
//! 모든 티커는 `Ticker`로 한 번 정규화한 뒤 사용합니다.
//!
//! - 앞뒤 공백 제거, 대문자 변환
//! - 클래스 주식 구분자 `.` → `-` (예: `BRK.B` → `BRK-B`, Yahoo Finance 형식)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 정규화된 티커.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// 원시 문자열에서 티커를 생성합니다.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_uppercase().replace('.', "-");

        let valid = !normalized.is_empty()
            && normalized.len() <= 12
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '^');

        if valid {
            Ok(Self(normalized))
        } else {
            Err(CoreError::InvalidTicker(raw.to_string()))
        }
    }

    /// 티커 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 티커 목록을 정규화하고 중복을 제거합니다 (입력 순서 유지).
///
/// 잘못된 티커는 경고 로그를 남기고 건너뜁니다.
pub fn normalize_tickers<I, S>(raw: I) -> Vec<Ticker>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut tickers = Vec::new();

    for item in raw {
        match Ticker::parse(item.as_ref()) {
            Ok(ticker) => {
                if seen.insert(ticker.clone()) {
                    tickers.push(ticker);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "티커 무시");
            }
        }
    }

    tickers
}
