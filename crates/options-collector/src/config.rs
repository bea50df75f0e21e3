//! 환경변수 기반 설정 모듈.
//!
//! `.env` → 환경변수 → CLI 순으로 덮어쓰며, 한 번 만든 설정은 수집기에
//! 그대로 전달됩니다.

use crate::error::CollectorError;
use crate::Result;
use options_data::provider::transport::YAHOO_BASE_URL;
use options_data::provider::universe::SP500_WIKIPEDIA_URL;
use options_data::storage::sqlite::DEFAULT_DATABASE_PATH;
use options_data::{DatabaseConfig, RateLimitConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// SQLite 파일 경로
    pub database_path: PathBuf,
    /// 요청 제한 설정
    pub fetch: FetchConfig,
    /// 옵션 수집 설정
    pub options_collect: OptionsCollectConfig,
    /// 외부 소스 URL
    pub sources: SourceConfig,
}

/// 요청 제한 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 동시 요청 수 상한
    pub max_concurrent: usize,
    /// 요청 시작 간 최소 간격
    pub rate_limit_delay: Duration,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 최대 재시도 횟수
    pub max_retries: u32,
    /// 백오프 기준 시간 (밀리초)
    pub backoff_base_ms: u64,
}

/// 옵션 수집 설정
#[derive(Debug, Clone)]
pub struct OptionsCollectConfig {
    /// 종목당 수집할 만기일 수 (가까운 순)
    pub max_expiration_dates: usize,
    /// 지수 ETF 포함 여부
    pub include_etfs: bool,
}

/// 외부 데이터 소스 설정
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub yahoo_base_url: String,
    pub sp500_url: String,
}

/// CLI에서 넘어오는 설정 덮어쓰기 값.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub max_concurrent: Option<usize>,
    /// 초 단위 (소수 허용)
    pub rate_limit_secs: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub max_expiration_dates: Option<usize>,
    pub include_etfs: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            fetch: FetchConfig {
                max_concurrent: 15,
                rate_limit_delay: Duration::from_millis(50),
                timeout_secs: 30,
                max_retries: 3,
                backoff_base_ms: 500,
            },
            options_collect: OptionsCollectConfig {
                max_expiration_dates: 30,
                include_etfs: false,
            },
            sources: SourceConfig {
                yahoo_base_url: YAHOO_BASE_URL.to_string(),
                sp500_url: SP500_WIKIPEDIA_URL.to_string(),
            },
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            fetch: FetchConfig {
                max_concurrent: env_var_parse("FETCH_MAX_CONCURRENT", defaults.fetch.max_concurrent),
                rate_limit_delay: std::env::var("FETCH_RATE_LIMIT_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.fetch.rate_limit_delay),
                timeout_secs: env_var_parse("FETCH_TIMEOUT_SECS", defaults.fetch.timeout_secs),
                max_retries: env_var_parse("FETCH_MAX_RETRIES", defaults.fetch.max_retries),
                backoff_base_ms: env_var_parse(
                    "FETCH_BACKOFF_BASE_MS",
                    defaults.fetch.backoff_base_ms,
                ),
            },
            options_collect: OptionsCollectConfig {
                max_expiration_dates: env_var_parse(
                    "OPTIONS_MAX_EXPIRATION_DATES",
                    defaults.options_collect.max_expiration_dates,
                ),
                include_etfs: env_var_bool(
                    "OPTIONS_INCLUDE_ETFS",
                    defaults.options_collect.include_etfs,
                ),
            },
            sources: SourceConfig {
                yahoo_base_url: std::env::var("YAHOO_BASE_URL")
                    .unwrap_or(defaults.sources.yahoo_base_url),
                sp500_url: std::env::var("SP500_SOURCE_URL").unwrap_or(defaults.sources.sp500_url),
            },
        };

        Ok(config)
    }

    /// CLI 값으로 덮어씁니다.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(n) = overrides.max_concurrent {
            self.fetch.max_concurrent = n;
        }
        if let Some(secs) = overrides.rate_limit_secs {
            let delay = Duration::try_from_secs_f64(secs).map_err(|_| {
                CollectorError::Config(format!("잘못된 --rate-limit 값: {}", secs))
            })?;
            self.fetch.rate_limit_delay = delay;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.fetch.timeout_secs = secs;
        }
        if let Some(n) = overrides.max_expiration_dates {
            self.options_collect.max_expiration_dates = n;
        }
        if overrides.include_etfs {
            self.options_collect.include_etfs = true;
        }
        Ok(self)
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_concurrent == 0 {
            return Err(CollectorError::Config(
                "max_concurrent는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(CollectorError::Config(
                "timeout은 1초 이상이어야 합니다".to_string(),
            ));
        }
        if self.options_collect.max_expiration_dates == 0 {
            return Err(CollectorError::Config(
                "max_expiration_dates는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(CollectorError::Config(
                "데이터베이스 경로가 비어 있습니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 데이터베이스 설정
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_path)
    }
}

impl FetchConfig {
    /// 요청 타임아웃
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `RateLimitedClient` 설정으로 변환
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_concurrent: self.max_concurrent,
            rate_limit_delay: self.rate_limit_delay,
            request_timeout: self.timeout(),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CollectorConfig::default();
        assert!(config.validate().is_ok());

        let rate = config.fetch.rate_limit();
        assert_eq!(rate.max_concurrent, 15);
        assert_eq!(rate.rate_limit_delay, Duration::from_millis(50));
        assert_eq!(rate.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = CollectorConfig::default()
            .with_overrides(ConfigOverrides {
                max_concurrent: Some(4),
                rate_limit_secs: Some(0.25),
                max_expiration_dates: Some(10),
                include_etfs: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.fetch.max_concurrent, 4);
        assert_eq!(config.fetch.rate_limit_delay, Duration::from_millis(250));
        assert_eq!(config.options_collect.max_expiration_dates, 10);
        assert!(config.options_collect.include_etfs);
    }

    #[test]
    fn test_sub_millisecond_rate_limit_kept() {
        let config = CollectorConfig::default()
            .with_overrides(ConfigOverrides {
                rate_limit_secs: Some(0.0005),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.fetch.rate_limit_delay, Duration::from_micros(500));
        assert_eq!(
            config.fetch.rate_limit().rate_limit_delay,
            Duration::from_micros(500)
        );
    }

    #[test]
    fn test_negative_rate_limit_rejected() {
        let result = CollectorConfig::default().with_overrides(ConfigOverrides {
            rate_limit_secs: Some(-1.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = CollectorConfig::default();
        config.fetch.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = CollectorConfig::default();
        config.options_collect.max_expiration_dates = 0;
        assert!(config.validate().is_err());

        let mut config = CollectorConfig::default();
        config.fetch.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
