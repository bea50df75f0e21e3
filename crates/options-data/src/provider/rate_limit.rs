//! 동시성/호출 간격 제한 클라이언트.
//!
//! 두 가지 제한을 독립적으로 적용합니다:
//!
//! - **동시 요청 수**: `Semaphore`로 진행 중인 요청을 `max_concurrent`개로 제한
//! - **요청 시작 간격**: `Pacer`가 요청 시작 시각을 `rate_limit_delay` 간격의
//!   슬롯으로 배정 (완료 시각이 아니라 시작 시각 기준)
//!
//! 따라서 처리량은 `min(max_concurrent / 평균 지연, 1 / rate_limit_delay)`입니다.
//!
//! # 재시도 정책
//!
//! `Network`, `RateLimited`, `Timeout`만 재시도하며 `n`번째 재시도 전에
//! `backoff_base * 2^n`만큼 대기합니다. 대기 중에는 동시성 슬롯을 반납합니다.
//! `RateLimited`를 받으면 공유 Pacer의 다음 슬롯도 같은 시간만큼 밀어
//! 다른 요청들도 함께 속도를 줄입니다.
//!
//! # 취소
//!
//! 취소 토큰이 발동되면 슬롯이나 호출 간격을 기다리던 요청과 백오프 중인
//! 요청은 외부로 나가지 않고 `Cancelled`로 끝납니다. 이미 시작된 요청은
//! 끝까지 진행됩니다.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::transport::{FetchRequest, RawResponse, Transport};
use crate::error::{DataError, Result};

/// 호출 제한 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 동시 진행 요청 수 상한
    pub max_concurrent: usize,
    /// 요청 시작 간 최소 간격
    pub rate_limit_delay: Duration,
    /// 요청당 타임아웃
    pub request_timeout: Duration,
    /// 최대 재시도 횟수 (0이면 재시도 없음)
    pub max_retries: u32,
    /// 지수 백오프 기준 시간
    pub backoff_base: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 15,
            rate_limit_delay: Duration::from_millis(50),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RateLimitConfig {
    /// `attempt`번째(0부터) 재시도 전 대기 시간.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// 요청 시작 슬롯 배정기.
struct Pacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// 다음 슬롯을 예약하고 그 시각까지 대기합니다.
    async fn wait_turn(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }

    /// 다음 슬롯을 최소 `cooldown` 이후로 미룹니다.
    async fn penalize(&self, cooldown: Duration) {
        let mut next = self.next_slot.lock().await;
        let candidate = Instant::now() + cooldown;
        if next.map_or(true, |reserved| reserved < candidate) {
            *next = Some(candidate);
        }
    }
}

/// `Transport`에 동시성 제한, 호출 간격, 타임아웃, 재시도를 적용하는 클라이언트.
///
/// 복제본은 같은 Semaphore와 Pacer를 공유합니다.
pub struct RateLimitedClient<T> {
    inner: Arc<T>,
    config: RateLimitConfig,
    semaphore: Arc<Semaphore>,
    pacer: Arc<Pacer>,
    requests: Arc<AtomicU64>,
    retries: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl<T> Clone for RateLimitedClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
            semaphore: Arc::clone(&self.semaphore),
            pacer: Arc::clone(&self.pacer),
            requests: Arc::clone(&self.requests),
            retries: Arc::clone(&self.retries),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T: Transport> RateLimitedClient<T> {
    /// 새 클라이언트 생성. `max_concurrent`가 0이면 1로 보정합니다.
    pub fn new(inner: T, config: RateLimitConfig) -> Self {
        let permits = config.max_concurrent.max(1);
        Self {
            inner: Arc::new(inner),
            semaphore: Arc::new(Semaphore::new(permits)),
            pacer: Arc::new(Pacer::new(config.rate_limit_delay)),
            config,
            requests: Arc::new(AtomicU64::new(0)),
            retries: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
        }
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 설정.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 내부 Transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// 지금까지 시작된 요청 수 (재시도 포함).
    pub fn requests_started(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// 지금까지 수행된 재시도 수.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// 슬롯 하나를 잡고 단일 시도를 수행합니다.
    async fn attempt(&self, request: &FetchRequest) -> Result<RawResponse> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DataError::Cancelled),
            permit = self.semaphore.acquire() => permit.map_err(|_| DataError::Cancelled)?,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DataError::Cancelled),
            _ = self.pacer.wait_turn() => {}
        }

        self.requests.fetch_add(1, Ordering::Relaxed);

        match tokio::time::timeout(self.config.request_timeout, self.inner.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(DataError::Timeout(format!(
                "{} ({}s)",
                request,
                self.config.request_timeout.as_secs_f64()
            ))),
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RateLimitedClient<T> {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let mut attempt = 0u32;

        loop {
            match self.attempt(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.backoff_for(attempt);

                    if matches!(e, DataError::RateLimited(_)) {
                        self.pacer.penalize(backoff).await;
                    }

                    warn!(
                        request = %request,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "요청 실패, 재시도 예정"
                    );

                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(DataError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(e) => {
                    debug!(request = %request, error = %e, "요청 최종 실패");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use options_core::Ticker;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    /// 요청 시작 시각과 동시 진행 수를 기록하는 Transport.
    #[derive(Default)]
    struct RecordingTransport {
        latency: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        starts: StdMutex<Vec<Instant>>,
        /// 앞에서부터 소비되는 실패 응답
        failures: StdMutex<Vec<DataError>>,
    }

    impl RecordingTransport {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Default::default()
            }
        }

        fn failing_with(errors: Vec<DataError>) -> Self {
            Self {
                failures: StdMutex::new(errors),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn fetch(&self, _request: &FetchRequest) -> Result<RawResponse> {
            self.starts.lock().unwrap().push(Instant::now());
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let failure = {
                let mut failures = self.failures.lock().unwrap();
                if failures.is_empty() {
                    None
                } else {
                    Some(failures.remove(0))
                }
            };

            match failure {
                Some(e) => Err(e),
                None => Ok(RawResponse::new(200, "{}")),
            }
        }
    }

    fn request() -> FetchRequest {
        FetchRequest::Expirations {
            symbol: Ticker::parse("SPY").unwrap(),
        }
    }

    fn config(max_concurrent: usize, delay_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            max_concurrent,
            rate_limit_delay: Duration::from_millis(delay_ms),
            request_timeout: Duration::from_secs(5),
            max_retries: 3,
            backoff_base: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_never_exceeds_limit() {
        let client = RateLimitedClient::new(
            RecordingTransport::with_latency(Duration::from_millis(200)),
            config(3, 1),
        );

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.fetch(&request()).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(client.inner().max_in_flight.load(Ordering::SeqCst), 3);
        assert_eq!(client.requests_started(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_starts_are_spaced() {
        let delay = Duration::from_millis(50);
        let client = RateLimitedClient::new(
            RecordingTransport::with_latency(Duration::from_millis(5)),
            config(10, 50),
        );

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.fetch(&request()).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut starts = client.inner().starts.lock().unwrap().clone();
        starts.sort();
        assert_eq!(starts.len(), 8);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= delay, "spacing {:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_with_backoff() {
        let client = RateLimitedClient::new(
            RecordingTransport::failing_with(vec![
                DataError::Network("connection reset".into()),
                DataError::RateLimited("429".into()),
            ]),
            config(1, 0),
        );

        let started = Instant::now();
        client.fetch(&request()).await.unwrap();

        assert_eq!(client.requests_started(), 3);
        assert_eq!(client.retries(), 2);
        // 100ms + 200ms 백오프
        assert!(Instant::now() - started >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let errors = (0..10)
            .map(|_| DataError::RateLimited("429".into()))
            .collect();
        let client = RateLimitedClient::new(RecordingTransport::failing_with(errors), config(1, 0));

        let result = client.fetch(&request()).await;

        assert!(matches!(result, Err(DataError::RateLimited(_))));
        assert_eq!(client.requests_started(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let client = RateLimitedClient::new(
            RecordingTransport::failing_with(vec![DataError::NotFound("ZZZZ".into())]),
            config(1, 0),
        );

        let result = client.fetch(&request()).await;

        assert!(matches!(result, Err(DataError::NotFound(_))));
        assert_eq!(client.requests_started(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transport_times_out() {
        let mut cfg = config(1, 0);
        cfg.request_timeout = Duration::from_millis(100);
        cfg.max_retries = 0;
        let client = RateLimitedClient::new(
            RecordingTransport::with_latency(Duration::from_secs(10)),
            cfg,
        );

        let result = client.fetch(&request()).await;

        assert!(matches!(result, Err(DataError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_cancelled_client_rejects_requests() {
        let cancel = CancellationToken::new();
        let client = RateLimitedClient::new(RecordingTransport::default(), config(2, 0))
            .with_cancellation(cancel.clone());
        cancel.cancel();

        let result = client.fetch(&request()).await;

        assert!(matches!(result, Err(DataError::Cancelled)));
        assert_eq!(client.requests_started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_queued_requests() {
        let cancel = CancellationToken::new();
        let client = RateLimitedClient::new(
            RecordingTransport::with_latency(Duration::from_millis(100)),
            config(2, 10),
        )
        .with_cancellation(cancel.clone());

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.fetch(&request()).await })
            })
            .collect();

        // 처음 두 요청이 진행 중일 때 취소
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let mut completed = 0;
        let mut cancelled = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => completed += 1,
                Err(DataError::Cancelled) => cancelled += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(completed, 2);
        assert_eq!(cancelled, 8);
        assert_eq!(client.requests_started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let mut cfg = config(1, 0);
        cfg.backoff_base = Duration::from_secs(60);
        let client = RateLimitedClient::new(
            RecordingTransport::failing_with(vec![DataError::Network("reset".into())]),
            cfg,
        )
        .with_cancellation(cancel.clone());

        let task = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch(&request()).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        assert!(matches!(task.await.unwrap(), Err(DataError::Cancelled)));
        assert_eq!(client.requests_started(), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let cfg = config(1, 0);
        assert_eq!(cfg.backoff_for(0), Duration::from_millis(100));
        assert_eq!(cfg.backoff_for(1), Duration::from_millis(200));
        assert_eq!(cfg.backoff_for(3), Duration::from_millis(800));
    }
}
