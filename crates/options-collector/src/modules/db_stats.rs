//! 데이터베이스 통계 조회 모듈.

use crate::Result;
use options_data::{Database, DatabaseStats};

/// 저장된 데이터 통계를 조회하고 로그로 남깁니다.
pub async fn show_database_stats(db: &Database) -> Result<DatabaseStats> {
    let stats = db.database_stats().await?;

    tracing::info!(
        total_contracts = stats.total_contracts,
        distinct_symbols = stats.distinct_symbols,
        stock_rows = stats.stock_rows,
        expiration_dates = stats.expiration_dates,
        latest_fetched_at = stats.latest_fetched_at.as_deref().unwrap_or("-"),
        "데이터베이스 통계"
    );

    Ok(stats)
}

/// 콘솔 출력용 통계 문자열.
pub fn format_database_stats(stats: &DatabaseStats) -> String {
    format!(
        "Database statistics\n  \
         option contracts : {}\n  \
         symbols (chains) : {}\n  \
         stock info rows  : {}\n  \
         expiration dates : {}\n  \
         latest fetch     : {}",
        stats.total_contracts,
        stats.distinct_symbols,
        stats.stock_rows,
        stats.expiration_dates,
        stats.latest_fetched_at.as_deref().unwrap_or("-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_database_stats() {
        let stats = DatabaseStats {
            total_contracts: 12,
            distinct_symbols: 2,
            stock_rows: 2,
            expiration_dates: 2,
            latest_fetched_at: None,
        };
        let text = format_database_stats(&stats);
        assert!(text.contains("option contracts : 12"));
        assert!(text.contains("latest fetch     : -"));
    }
}
