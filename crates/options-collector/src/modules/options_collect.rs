//! 옵션 체인 수집 모듈.
//!
//! 심볼마다 종목 정보 → 만기일 목록 → 만기별 체인 순으로 조회하고,
//! 심볼 단위로 저장합니다. 심볼과 만기일은 동시에 처리되며 실제 요청 수는
//! `RateLimitedClient`가 전역으로 제한합니다.

use crate::{CollectionStats, CollectorConfig, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use options_core::{select_expirations, OptionContract, Ticker};
use options_data::{
    DataError, Database, HttpTransport, OptionsChainRepository, OptionsSource, RateLimitedClient,
    StockInfoRepository, YahooOptionsSource,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// 설정에 맞춘 Yahoo Finance 소스를 만듭니다.
///
/// `cancel`이 발동되면 아직 나가지 않은 요청은 `Cancelled`로 끝납니다.
pub fn yahoo_source(
    config: &CollectorConfig,
    cancel: CancellationToken,
) -> Result<Arc<dyn OptionsSource>> {
    let http = HttpTransport::new(&config.sources.yahoo_base_url, config.fetch.timeout())?;
    let client =
        RateLimitedClient::new(http, config.fetch.rate_limit()).with_cancellation(cancel);
    Ok(Arc::new(YahooOptionsSource::new(client)))
}

/// 옵션 체인 수집기.
pub struct OptionsCollector {
    source: Arc<dyn OptionsSource>,
    stock_repo: StockInfoRepository,
    chain_repo: OptionsChainRepository,
    max_concurrent: usize,
    max_expiration_dates: usize,
    cancel: CancellationToken,
}

impl OptionsCollector {
    pub fn new(
        config: &CollectorConfig,
        source: Arc<dyn OptionsSource>,
        db: Database,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            stock_repo: StockInfoRepository::new(db.clone()),
            chain_repo: OptionsChainRepository::new(db),
            max_concurrent: config.fetch.max_concurrent.max(1),
            max_expiration_dates: config.options_collect.max_expiration_dates,
            cancel,
        }
    }

    /// 심볼 목록을 수집합니다.
    ///
    /// 개별 요청/저장 실패는 통계에만 반영되고 실행을 중단시키지 않습니다.
    /// 취소되면 새 작업을 시작하지 않고 진행 중인 요청이 끝나기를 기다린 뒤
    /// 이미 받은 데이터를 저장하고 반환합니다.
    pub async fn run(&self, symbols: &[Ticker]) -> CollectionStats {
        let start = Instant::now();
        let mut stats = CollectionStats::new();

        tracing::info!(
            symbols = symbols.len(),
            source = self.source.name(),
            max_concurrent = self.max_concurrent,
            max_expiration_dates = self.max_expiration_dates,
            "옵션 체인 수집 시작"
        );

        let mut results = stream::iter(symbols)
            .map(|symbol| self.collect_symbol(symbol))
            .buffer_unordered(self.max_concurrent);

        let mut done = 0usize;
        while let Some(symbol_stats) = results.next().await {
            done += 1;
            stats.merge(&symbol_stats);
            tracing::debug!(progress = format!("{}/{}", done, symbols.len()), "심볼 처리");
        }

        if self.cancel.is_cancelled() {
            stats.cancelled = true;
            tracing::warn!("취소 요청으로 수집이 중단되었습니다");
        }

        stats.elapsed = start.elapsed();
        stats
    }

    async fn collect_symbol(&self, symbol: &Ticker) -> CollectionStats {
        let mut stats = CollectionStats {
            symbols_total: 1,
            ..Default::default()
        };

        if self.cancel.is_cancelled() {
            stats.symbols_skipped = 1;
            stats.cancelled = true;
            return stats;
        }

        // 1. 종목 정보
        let info = match self.source.stock_info(symbol).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                stats.symbols_skipped = 1;
                tracing::info!(symbol = %symbol, "종목 정보 없음, 건너뜀");
                return stats;
            }
            Err(DataError::Cancelled) => {
                stats.symbols_skipped = 1;
                stats.cancelled = true;
                return stats;
            }
            Err(e) => {
                stats.fetch_errors += 1;
                tracing::warn!(symbol = %symbol, error = %e, "종목 정보 조회 실패");
                return stats;
            }
        };

        if let Err(e) = self.stock_repo.upsert(&info).await {
            stats.storage_errors += 1;
            tracing::error!(symbol = %symbol, error = %e, "종목 정보 저장 실패, 옵션 체인 건너뜀");
            return stats;
        }
        stats.stock_rows_stored = 1;
        stats.symbols_processed = 1;

        if self.cancel.is_cancelled() {
            stats.cancelled = true;
            return stats;
        }

        // 2. 만기일 목록
        let available = match self.source.expirations(symbol).await {
            Ok(dates) => dates,
            Err(e) if e.is_not_found() => {
                tracing::debug!(symbol = %symbol, "상장된 옵션 없음");
                return stats;
            }
            Err(DataError::Cancelled) => {
                stats.cancelled = true;
                return stats;
            }
            Err(e) => {
                stats.fetch_errors += 1;
                tracing::warn!(symbol = %symbol, error = %e, "만기일 조회 실패");
                return stats;
            }
        };

        let expirations = select_expirations(available, self.max_expiration_dates);

        // 3. 만기별 체인
        let contracts = self.fetch_chains(symbol, &expirations, &mut stats).await;

        // 4. 저장
        if !contracts.is_empty() {
            match self.chain_repo.upsert_batch(&contracts).await {
                Ok(report) => {
                    stats.contracts_stored += report.stored;
                    stats.storage_errors += report.failed;
                }
                Err(e) => {
                    stats.storage_errors += contracts.len();
                    tracing::error!(symbol = %symbol, error = %e, "옵션 체인 저장 실패");
                }
            }
        }

        tracing::info!(
            symbol = %symbol,
            expirations = expirations.len(),
            failed_expirations = stats.failed_expirations,
            contracts = stats.contracts_stored,
            "심볼 수집 완료"
        );

        stats
    }

    async fn fetch_chains(
        &self,
        symbol: &Ticker,
        expirations: &[NaiveDate],
        stats: &mut CollectionStats,
    ) -> Vec<OptionContract> {
        let results: Vec<(NaiveDate, Option<options_data::Result<Vec<OptionContract>>>)> =
            stream::iter(expirations.iter().copied())
                .map(|expiration| async move {
                    if self.cancel.is_cancelled() {
                        return (expiration, None);
                    }
                    let result = self.source.option_chain(symbol, expiration).await;
                    (expiration, Some(result))
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        let mut contracts = Vec::new();
        for (expiration, result) in results {
            match result {
                Some(Ok(chain)) => contracts.extend(chain),
                None | Some(Err(DataError::Cancelled)) => stats.cancelled = true,
                Some(Err(e)) => {
                    stats.failed_expirations += 1;
                    tracing::warn!(
                        symbol = %symbol,
                        expiration = %expiration,
                        error = %e,
                        "옵션 체인 조회 실패"
                    );
                }
            }
        }

        contracts
    }
}

/// 옵션 체인 수집
///
/// Yahoo Finance 소스로 `symbols`를 수집해 `db`에 저장합니다.
pub async fn collect_options(
    db: &Database,
    config: &CollectorConfig,
    symbols: &[Ticker],
    cancel: CancellationToken,
) -> Result<CollectionStats> {
    if symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        return Ok(CollectionStats::new());
    }

    let source = yahoo_source(config, cancel.clone())?;
    let collector = OptionsCollector::new(config, source, db.clone(), cancel);
    Ok(collector.run(symbols).await)
}
