//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 대상 심볼 수
    pub symbols_total: usize,
    /// 종목 정보 저장까지 진행된 심볼 수
    pub symbols_processed: usize,
    /// 건너뛴 심볼 수 (데이터 없음, 취소)
    pub symbols_skipped: usize,
    /// 저장된 종목 정보 수
    pub stock_rows_stored: usize,
    /// 저장된 옵션 계약 수
    pub contracts_stored: usize,
    /// 조회 실패 횟수 (종목 정보, 만기일 목록)
    pub fetch_errors: usize,
    /// 조회에 실패한 만기일 수
    pub failed_expirations: usize,
    /// 저장 실패 건수
    pub storage_errors: usize,
    /// 취소로 중단되었는지 여부
    pub cancelled: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼 단위 결과를 합칩니다.
    pub fn merge(&mut self, other: &CollectionStats) {
        self.symbols_total += other.symbols_total;
        self.symbols_processed += other.symbols_processed;
        self.symbols_skipped += other.symbols_skipped;
        self.stock_rows_stored += other.stock_rows_stored;
        self.contracts_stored += other.contracts_stored;
        self.fetch_errors += other.fetch_errors;
        self.failed_expirations += other.failed_expirations;
        self.storage_errors += other.storage_errors;
        self.cancelled |= other.cancelled;
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.symbols_total == 0 {
            0.0
        } else {
            (self.symbols_processed as f64 / self.symbols_total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            symbols_total = self.symbols_total,
            symbols_processed = self.symbols_processed,
            symbols_skipped = self.symbols_skipped,
            stock_rows_stored = self.stock_rows_stored,
            contracts_stored = self.contracts_stored,
            fetch_errors = self.fetch_errors,
            failed_expirations = self.failed_expirations,
            storage_errors = self.storage_errors,
            cancelled = self.cancelled,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
