//! 만기일 처리.
//!
//! Yahoo Finance는 만기일을 해당 날짜 00:00 UTC의 epoch 초로 표현합니다.

use chrono::{DateTime, NaiveDate};

/// 만기일 목록에서 가장 이른 `max_dates`개를 선택합니다.
///
/// 정렬 후 중복을 제거하므로 입력 순서와 무관하게 결과는 오름차순입니다.
pub fn select_expirations<I>(dates: I, max_dates: usize) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort_unstable();
    dates.dedup();
    dates.truncate(max_dates);
    dates
}

/// 만기일을 epoch 초(00:00 UTC)로 변환합니다.
pub fn expiration_to_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// epoch 초를 만기일(UTC 기준)로 변환합니다.
pub fn expiration_from_epoch(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}
