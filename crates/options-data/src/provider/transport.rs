//! 외부 데이터 소스 호출 계층.

use async_trait::async_trait;
use chrono::NaiveDate;
use options_core::{expiration_to_epoch, Ticker};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::{DataError, Result};

/// Yahoo Finance 기본 URL.
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

/// 외부 소스에 보내는 요청 단위.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// 종목 기본 정보
    StockInfo { symbol: Ticker },
    /// 만기일 목록
    Expirations { symbol: Ticker },
    /// 특정 만기일의 옵션 체인
    OptionChain { symbol: Ticker, expiration: NaiveDate },
}

impl FetchRequest {
    /// 요청 대상 티커.
    pub fn symbol(&self) -> &Ticker {
        match self {
            Self::StockInfo { symbol }
            | Self::Expirations { symbol }
            | Self::OptionChain { symbol, .. } => symbol,
        }
    }

    /// 로그용 요청 종류.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StockInfo { .. } => "stock_info",
            Self::Expirations { .. } => "expirations",
            Self::OptionChain { .. } => "option_chain",
        }
    }

    /// Yahoo Finance 경로.
    pub fn path(&self) -> String {
        match self {
            Self::StockInfo { symbol } => format!("/v8/finance/chart/{}", symbol),
            Self::Expirations { symbol } | Self::OptionChain { symbol, .. } => {
                format!("/v7/finance/options/{}", symbol)
            }
        }
    }

    /// 쿼리 파라미터.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::StockInfo { .. } => vec![
                ("range", "1d".to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
            ],
            Self::Expirations { .. } => Vec::new(),
            Self::OptionChain { expiration, .. } => {
                vec![("date", expiration_to_epoch(*expiration).to_string())]
            }
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptionChain { symbol, expiration } => {
                write!(f, "{} {} {}", self.kind(), symbol, expiration)
            }
            _ => write!(f, "{} {}", self.kind(), self.symbol()),
        }
    }
}

/// 성공한 요청의 원시 응답.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 본문을 타입이 있는 스키마로 역직렬화합니다.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| DataError::Parse(e.to_string()))
    }
}

/// 외부 소스 호출 trait.
///
/// 구현체는 HTTP 상태를 `DataError`로 분류해야 합니다:
/// 429 → `RateLimited`, 404 → `NotFound`, 5xx/연결 실패 → `Network`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        (**self).fetch(request).await
    }
}

/// reqwest 기반 HTTP Transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// 새 HTTP Transport 생성.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, request.path());

        let response = self
            .client
            .get(&url)
            .query(&request.query())
            .send()
            .await?;

        let status = response.status();
        debug!(request = %request, status = status.as_u16(), "HTTP 응답 수신");

        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(DataError::RateLimited(request.to_string())),
            StatusCode::NOT_FOUND => Err(DataError::NotFound(request.to_string())),
            s if s.is_server_error() => Err(DataError::Network(format!(
                "HTTP {} ({})",
                s.as_u16(),
                request
            ))),
            s if !s.is_success() => Err(DataError::Provider(format!(
                "HTTP {} ({})",
                s.as_u16(),
                request
            ))),
            s => {
                let body = response.text().await?;
                Ok(RawResponse::new(s.as_u16(), body))
            }
        }
    }
}
