//! 수집 대상 심볼 유니버스.
//!
//! S&P 500 구성 종목은 Wikipedia `List of S&P 500 companies` 페이지의
//! `constituents` 테이블에서 가져오고, 지수 ETF는 고정 목록을 사용합니다.

use options_core::{normalize_tickers, Ticker};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{DataError, Result};

/// S&P 500 구성 종목 페이지.
pub const SP500_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";

/// 옵션 거래가 활발한 주요 지수 ETF.
pub const INDEX_ETFS: &[&str] = &[
    "SPY", "QQQ", "IWM", "DIA", "VOO", "VTI", "EEM", "EFA", "TLT", "GLD", "XLF", "XLE", "XLK",
    "XLV", "XLI", "XLY", "XLP", "XLU", "XLB", "XLRE", "XLC", "SMH", "ARKK", "HYG",
];

/// 유니버스 선택 옵션.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniverseSelection {
    pub include_sp500: bool,
    pub include_etfs: bool,
}

impl Default for UniverseSelection {
    fn default() -> Self {
        Self {
            include_sp500: true,
            include_etfs: false,
        }
    }
}

impl UniverseSelection {
    /// ETF만 선택.
    pub fn etfs_only() -> Self {
        Self {
            include_sp500: false,
            include_etfs: true,
        }
    }
}

/// 심볼 유니버스 조회기.
pub struct SymbolUniverse {
    client: reqwest::Client,
    sp500_url: String,
}

impl SymbolUniverse {
    /// 지정한 URL에서 S&P 500 목록을 가져오는 유니버스를 생성합니다.
    pub fn new(sp500_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("options-collector/0.1")
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            sp500_url: sp500_url.into(),
        })
    }

    /// 지수 ETF 목록.
    pub fn index_etfs() -> Vec<Ticker> {
        normalize_tickers(INDEX_ETFS.iter().copied())
    }

    /// S&P 500 구성 종목을 조회합니다.
    pub async fn sp500(&self) -> Result<Vec<Ticker>> {
        let response = self.client.get(&self.sp500_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Provider(format!(
                "S&P 500 목록 조회 실패: HTTP {}",
                status.as_u16()
            )));
        }

        let html = response.text().await?;
        let symbols = parse_sp500_table(&html)?;

        info!(count = symbols.len(), "S&P 500 구성 종목 조회 완료");
        Ok(symbols)
    }

    /// 선택 옵션에 따라 심볼 목록을 만듭니다.
    ///
    /// S&P 500 조회에 실패하면 오류를 반환합니다. 순서는 S&P 500, ETF 순이며
    /// 중복은 제거됩니다.
    pub async fn resolve(&self, selection: &UniverseSelection) -> Result<Vec<Ticker>> {
        let mut symbols: Vec<Ticker> = Vec::new();

        if selection.include_sp500 {
            symbols.extend(self.sp500().await?);
        }
        if selection.include_etfs {
            symbols.extend(Self::index_etfs());
        }

        let symbols = normalize_tickers(symbols.iter().map(Ticker::as_str));
        if symbols.is_empty() {
            warn!("선택된 심볼이 없습니다");
        }
        Ok(symbols)
    }
}

/// Wikipedia 구성 종목 테이블 HTML에서 티커를 추출합니다.
///
/// 각 행의 첫 번째 셀이 티커입니다. `BRK.B`는 `BRK-B`로 정규화됩니다.
pub fn parse_sp500_table(html: &str) -> Result<Vec<Ticker>> {
    let document = Html::parse_document(html);

    let table_selector = selector("table#constituents")?;
    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| DataError::Parse("constituents 테이블을 찾을 수 없습니다".to_string()))?;

    let raw: Vec<String> = table
        .select(&row_selector)
        .filter_map(|row| row.select(&cell_selector).next())
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    let symbols = normalize_tickers(raw.iter().map(String::as_str));
    if symbols.is_empty() {
        return Err(DataError::Parse(
            "constituents 테이블에 종목이 없습니다".to_string(),
        ));
    }

    Ok(symbols)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DataError::Parse(format!("잘못된 selector {}: {}", css, e)))
}
