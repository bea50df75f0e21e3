//! SQLite 스토리지 구현.
//!
//! 단일 SQLite 파일에 `stock_info`, `options_chain` 두 테이블을 두고
//! repository 패턴으로 upsert/조회를 제공합니다.
//!
//! 쓰기는 단일 연결 풀로 직렬화됩니다 (WAL, busy timeout 설정).

use chrono::{DateTime, NaiveDate, Utc};
use options_core::{OptionContract, OptionType, StockInfo, Ticker};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use sqlx::FromRow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DataError, Result};

/// 기본 데이터베이스 파일 경로.
pub const DEFAULT_DATABASE_PATH: &str = "data/options/market_data.db";

/// 데이터베이스 설정.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite 파일 경로
    pub path: PathBuf,
    /// 잠금 대기 시간
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 데이터베이스 파일을 열거나 생성합니다.
    ///
    /// 상위 디렉터리가 없으면 만듭니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(path = %config.path.display(), "데이터베이스 연결 중...");

        ensure_parent_dir(&config.path)?;

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        info!("데이터베이스 연결 완료");

        Ok(Self { pool })
    }

    /// 메모리 데이터베이스를 엽니다.
    ///
    /// 단일 연결이 닫히면 데이터가 사라지므로 유휴/수명 만료를 끕니다.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .shared_cache(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("마이그레이션 실행 중...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::Migration(e.to_string()))?;

        info!("마이그레이션 완료");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;
        Ok(true)
    }

    /// 전체 통계를 조회합니다.
    pub async fn database_stats(&self) -> Result<DatabaseStats> {
        let stats: DatabaseStats = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM options_chain) AS total_contracts,
                (SELECT COUNT(DISTINCT symbol) FROM options_chain) AS distinct_symbols,
                (SELECT COUNT(*) FROM stock_info) AS stock_rows,
                (SELECT COUNT(DISTINCT expiration_date) FROM options_chain) AS expiration_dates,
                (SELECT MAX(fetched_at) FROM options_chain) AS latest_fetched_at
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// 연결 풀을 닫습니다.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                DataError::Connection(format!("디렉터리 생성 실패 {}: {}", parent.display(), e))
            })
        }
        _ => Ok(()),
    }
}

/// 데이터베이스 통계.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct DatabaseStats {
    pub total_contracts: i64,
    pub distinct_symbols: i64,
    pub stock_rows: i64,
    pub expiration_dates: i64,
    pub latest_fetched_at: Option<String>,
}

// =============================================================================
// Stock Info Repository
// =============================================================================

/// 종목 정보 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct StockInfoRecord {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl StockInfoRecord {
    /// StockInfo 도메인 객체로 변환.
    pub fn to_stock_info(&self) -> Result<StockInfo> {
        let symbol =
            Ticker::parse(&self.symbol).map_err(|e| DataError::Parse(e.to_string()))?;

        Ok(StockInfo {
            symbol,
            company_name: self.company_name.clone(),
            sector: self.sector.clone(),
            industry: self.industry.clone(),
            exchange: self.exchange.clone(),
            currency: self.currency.clone(),
            current_price: self.current_price,
            market_cap: self.market_cap,
            updated_at: self.updated_at,
        })
    }
}

/// 종목 정보 repository.
#[derive(Clone)]
pub struct StockInfoRepository {
    db: Database,
}

impl StockInfoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 종목 정보를 삽입하거나 덮어씁니다.
    #[instrument(skip(self, info), fields(symbol = %info.symbol))]
    pub async fn upsert(&self, info: &StockInfo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_info
                (symbol, company_name, sector, industry, exchange, currency,
                 current_price, market_cap, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol) DO UPDATE SET
                company_name = excluded.company_name,
                sector = excluded.sector,
                industry = excluded.industry,
                exchange = excluded.exchange,
                currency = excluded.currency,
                current_price = excluded.current_price,
                market_cap = excluded.market_cap,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(info.symbol.as_str())
        .bind(&info.company_name)
        .bind(&info.sector)
        .bind(&info.industry)
        .bind(&info.exchange)
        .bind(&info.currency)
        .bind(info.current_price)
        .bind(info.market_cap)
        .bind(info.updated_at)
        .execute(self.db.pool())
        .await?;

        debug!("종목 정보 저장");
        Ok(())
    }

    /// 종목 정보를 조회합니다.
    pub async fn get(&self, symbol: &Ticker) -> Result<Option<StockInfo>> {
        let record: Option<StockInfoRecord> =
            sqlx::query_as("SELECT * FROM stock_info WHERE symbol = ?")
                .bind(symbol.as_str())
                .fetch_optional(self.db.pool())
                .await?;

        record.map(|r| r.to_stock_info()).transpose()
    }

    /// 저장된 종목 수.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_info")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Options Chain Repository
// =============================================================================

/// 옵션 계약 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct OptionContractRecord {
    pub symbol: String,
    pub expiration_date: NaiveDate,
    pub strike: f64,
    pub option_type: String,
    pub contract_symbol: Option<String>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last_price: Option<f64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub implied_volatility: Option<f64>,
    pub in_the_money: Option<bool>,
    pub last_trade_date: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl OptionContractRecord {
    /// OptionContract 도메인 객체로 변환.
    pub fn to_contract(&self) -> Result<OptionContract> {
        let symbol =
            Ticker::parse(&self.symbol).map_err(|e| DataError::Parse(e.to_string()))?;
        let option_type: OptionType = self
            .option_type
            .parse()
            .map_err(|e: options_core::CoreError| DataError::Parse(e.to_string()))?;

        Ok(OptionContract {
            symbol,
            expiration_date: self.expiration_date,
            strike: self.strike,
            option_type,
            contract_symbol: self.contract_symbol.clone(),
            bid: self.bid,
            ask: self.ask,
            last_price: self.last_price,
            volume: self.volume,
            open_interest: self.open_interest,
            implied_volatility: self.implied_volatility,
            in_the_money: self.in_the_money,
            last_trade_date: self.last_trade_date,
            fetched_at: self.fetched_at,
        })
    }
}

/// 일괄 저장 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// 저장된 계약 수
    pub stored: usize,
    /// 실패해서 버려진 계약 수
    pub failed: usize,
}

/// 옵션 체인 repository.
#[derive(Clone)]
pub struct OptionsChainRepository {
    db: Database,
}

impl OptionsChainRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 계약 목록을 한 트랜잭션으로 upsert합니다.
    ///
    /// 개별 계약의 실패는 로그를 남기고 건너뜁니다. 트랜잭션 시작/커밋
    /// 실패만 오류로 반환됩니다.
    #[instrument(skip(self, contracts), fields(count = contracts.len()))]
    pub async fn upsert_batch(&self, contracts: &[OptionContract]) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        if contracts.is_empty() {
            return Ok(report);
        }

        let mut tx = self.db.pool().begin().await?;

        for contract in contracts {
            let result = sqlx::query(
                r#"
                INSERT INTO options_chain
                    (symbol, expiration_date, strike, option_type, contract_symbol,
                     bid, ask, last_price, volume, open_interest, implied_volatility,
                     in_the_money, last_trade_date, fetched_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (symbol, expiration_date, strike, option_type) DO UPDATE SET
                    contract_symbol = excluded.contract_symbol,
                    bid = excluded.bid,
                    ask = excluded.ask,
                    last_price = excluded.last_price,
                    volume = excluded.volume,
                    open_interest = excluded.open_interest,
                    implied_volatility = excluded.implied_volatility,
                    in_the_money = excluded.in_the_money,
                    last_trade_date = excluded.last_trade_date,
                    fetched_at = excluded.fetched_at
                "#,
            )
            .bind(contract.symbol.as_str())
            .bind(contract.expiration_date)
            .bind(contract.strike)
            .bind(contract.option_type.as_str())
            .bind(&contract.contract_symbol)
            .bind(contract.bid)
            .bind(contract.ask)
            .bind(contract.last_price)
            .bind(contract.volume)
            .bind(contract.open_interest)
            .bind(contract.implied_volatility)
            .bind(contract.in_the_money)
            .bind(contract.last_trade_date)
            .bind(contract.fetched_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => report.stored += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        symbol = %contract.symbol,
                        expiration = %contract.expiration_date,
                        strike = contract.strike,
                        option_type = %contract.option_type,
                        error = %e,
                        "옵션 계약 저장 실패"
                    );
                }
            }
        }

        tx.commit().await?;

        debug!(stored = report.stored, failed = report.failed, "옵션 체인 저장");
        Ok(report)
    }

    /// 종목의 옵션 체인을 조회합니다.
    ///
    /// `expiration`이 주어지면 해당 만기만 반환합니다.
    /// 정렬: 만기일, 콜/풋, 행사가 순.
    pub async fn get_chain(
        &self,
        symbol: &Ticker,
        expiration: Option<NaiveDate>,
    ) -> Result<Vec<OptionContract>> {
        let records: Vec<OptionContractRecord> = match expiration {
            Some(date) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM options_chain
                    WHERE symbol = ? AND expiration_date = ?
                    ORDER BY expiration_date, option_type, strike
                    "#,
                )
                .bind(symbol.as_str())
                .bind(date)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM options_chain
                    WHERE symbol = ?
                    ORDER BY expiration_date, option_type, strike
                    "#,
                )
                .bind(symbol.as_str())
                .fetch_all(self.db.pool())
                .await?
            }
        };

        records.iter().map(OptionContractRecord::to_contract).collect()
    }

    /// 저장된 계약 수.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM options_chain")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
