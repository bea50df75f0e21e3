//! 수집 대상 심볼 결정 모듈.

use crate::error::CollectorError;
use crate::{CollectorConfig, Result};
use options_core::{normalize_tickers, Ticker};
use options_data::{SymbolUniverse, UniverseSelection};

/// CLI에서 받은 심볼 선택 옵션.
#[derive(Debug, Clone, Default)]
pub struct SymbolSelection {
    /// 직접 지정한 심볼 (있으면 유니버스 조회를 건너뜀)
    pub symbols: Vec<String>,
    /// 지수 ETF만 수집
    pub etfs_only: bool,
}

/// 수집할 심볼 목록을 결정합니다.
///
/// S&P 500 목록을 가져오지 못하면 시작 단계 오류로 반환합니다.
pub async fn resolve_symbols(
    config: &CollectorConfig,
    selection: &SymbolSelection,
) -> Result<Vec<Ticker>> {
    if !selection.symbols.is_empty() {
        let symbols = normalize_tickers(&selection.symbols);
        if symbols.is_empty() {
            return Err(CollectorError::Config(
                "유효한 심볼이 없습니다".to_string(),
            ));
        }
        tracing::info!(count = symbols.len(), "지정 심볼 수집");
        return Ok(symbols);
    }

    let universe_selection = if selection.etfs_only {
        UniverseSelection::etfs_only()
    } else {
        UniverseSelection {
            include_sp500: true,
            include_etfs: config.options_collect.include_etfs,
        }
    };

    let universe = SymbolUniverse::new(&config.sources.sp500_url, config.fetch.timeout())?;
    let symbols = universe.resolve(&universe_selection).await?;

    tracing::info!(
        count = symbols.len(),
        sp500 = universe_selection.include_sp500,
        etfs = universe_selection.include_etfs,
        "심볼 유니버스 조회 완료"
    );
    Ok(symbols)
}
