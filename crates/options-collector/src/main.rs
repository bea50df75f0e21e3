//! Standalone options chain collector CLI.

use clap::Parser;
use options_collector::modules::{self, SymbolSelection};
use options_collector::{CollectorConfig, ConfigOverrides};
use options_core::{init_logging, LogConfig, LogFormat};
use options_data::Database;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "options-collector")]
#[command(about = "Options chain collector for S&P 500 stocks and index ETFs", long_about = None)]
#[command(version)]
struct Cli {
    /// 수집할 심볼 (지정하면 S&P 500 목록을 사용하지 않음)
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// 지수 ETF 포함
    #[arg(long)]
    include_etfs: bool,

    /// 지수 ETF만 수집
    #[arg(long, conflicts_with = "symbols")]
    etfs_only: bool,

    /// 종목당 수집할 만기일 수 (가까운 순)
    #[arg(long)]
    max_expiration_dates: Option<usize>,

    /// 요청 시작 간 최소 간격 (초, 예: 0.05)
    #[arg(long)]
    rate_limit: Option<f64>,

    /// 동시 요청 수 상한
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// 데이터베이스 통계만 출력하고 종료
    #[arg(long)]
    stats: bool,

    /// SQLite 파일 경로
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// 요청 타임아웃 (초)
    #[arg(long)]
    timeout: Option<u64>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(
        LogConfig::new(&cli.log_level)
            .with_format(cli.log_format)
            .with_target("options_collector")
            .with_target("options_data")
            .with_target("options_core"),
    )?;

    tracing::info!("Options Chain Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?.with_overrides(ConfigOverrides {
        database_path: cli.db_path,
        max_concurrent: cli.max_concurrent,
        rate_limit_secs: cli.rate_limit,
        timeout_secs: cli.timeout,
        max_expiration_dates: cli.max_expiration_dates,
        include_etfs: cli.include_etfs,
    })?;
    config.validate()?;
    tracing::debug!(config = ?config, "설정 로드 완료");

    // DB 연결
    let db = Database::connect(&config.database()).await?;
    db.migrate().await?;
    db.health_check().await?;

    if cli.stats {
        let stats = modules::show_database_stats(&db).await?;
        println!("{}", modules::format_database_stats(&stats));
        db.close().await;
        return Ok(());
    }

    // 심볼 결정
    let symbols = modules::resolve_symbols(
        &config,
        &SymbolSelection {
            symbols: cli.symbols,
            etfs_only: cli.etfs_only,
        },
    )
    .await?;

    // Ctrl-C → 새 작업 중단, 진행 중 요청은 마무리
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 진행 중인 요청을 마무리합니다...");
            signal_token.cancel();
        }
    });

    let stats = modules::collect_options(&db, &config, &symbols, cancel).await?;
    stats.log_summary("옵션 체인 수집");

    db.close().await;
    tracing::info!("Options Chain Collector 종료");

    Ok(())
}
