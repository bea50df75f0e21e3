//! Yahoo Finance 옵션 체인 소스.
//!
//! 응답은 모두 아래의 명시적인 스키마로 역직렬화합니다. 필수 필드가 없으면
//! `Parse`, `result`가 비어 있으면 `NotFound`로 분류합니다.
//!
//! - `/v8/finance/chart/{symbol}`: 종목명, 현재가, 거래소, 통화
//! - `/v7/finance/options/{symbol}`: 만기일 목록 (epoch 초)
//! - `/v7/finance/options/{symbol}?date={epoch}`: 만기별 콜/풋 체인

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use options_core::{expiration_from_epoch, OptionContract, OptionType, StockInfo, Ticker};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::transport::{FetchRequest, RawResponse, Transport};
use super::OptionsSource;
use crate::error::{DataError, Result};

// ==================== 응답 스키마 ====================

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooError {
    fn is_not_found(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("not found"))
    }

    fn message(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainBody,
}

#[derive(Debug, Deserialize)]
struct OptionChainBody {
    result: Option<Vec<OptionChainResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionChainResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsByExpiration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsByExpiration {
    #[serde(default)]
    expiration_date: Option<i64>,
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    strike: f64,
    #[serde(default)]
    contract_symbol: Option<String>,
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    open_interest: Option<f64>,
    #[serde(default)]
    implied_volatility: Option<f64>,
    #[serde(default)]
    in_the_money: Option<bool>,
    #[serde(default)]
    last_trade_date: Option<i64>,
}

impl YahooContract {
    fn into_contract(
        self,
        symbol: &Ticker,
        expiration: NaiveDate,
        option_type: OptionType,
        fetched_at: DateTime<Utc>,
    ) -> OptionContract {
        OptionContract {
            symbol: symbol.clone(),
            expiration_date: expiration,
            strike: self.strike,
            option_type,
            contract_symbol: self.contract_symbol,
            bid: self.bid,
            ask: self.ask,
            last_price: self.last_price,
            volume: self.volume.map(|v| v.round() as i64),
            open_interest: self.open_interest.map(|v| v.round() as i64),
            implied_volatility: self.implied_volatility,
            in_the_money: self.in_the_money,
            last_trade_date: self
                .last_trade_date
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            fetched_at,
        }
    }
}

// ==================== 파싱 ====================

/// 차트 응답에서 종목 정보를 추출합니다.
pub fn parse_stock_info(symbol: &Ticker, raw: &RawResponse) -> Result<StockInfo> {
    let envelope: ChartEnvelope = raw.json()?;

    if let Some(error) = envelope.chart.error {
        return Err(if error.is_not_found() {
            DataError::NotFound(format!("{}: {}", symbol, error.message()))
        } else {
            DataError::Provider(format!("{}: {}", symbol, error.message()))
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NotFound(format!("종목 정보 없음: {}", symbol)))?;

    let meta = result.meta;
    if !meta.symbol.eq_ignore_ascii_case(symbol.as_str()) {
        debug!(requested = %symbol, returned = %meta.symbol, "응답 심볼 불일치");
    }

    Ok(StockInfo {
        symbol: symbol.clone(),
        company_name: meta.long_name.or(meta.short_name),
        sector: None,
        industry: None,
        exchange: meta.exchange_name,
        currency: meta.currency,
        current_price: meta.regular_market_price,
        market_cap: None,
        updated_at: Utc::now(),
    })
}

fn first_option_chain(symbol: &Ticker, raw: &RawResponse) -> Result<OptionChainResult> {
    let envelope: OptionsEnvelope = raw.json()?;

    if let Some(error) = envelope.option_chain.error {
        return Err(if error.is_not_found() {
            DataError::NotFound(format!("{}: {}", symbol, error.message()))
        } else {
            DataError::Provider(format!("{}: {}", symbol, error.message()))
        });
    }

    envelope
        .option_chain
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NotFound(format!("옵션 데이터 없음: {}", symbol)))
}

/// 옵션 응답에서 만기일 목록을 추출합니다.
pub fn parse_expirations(symbol: &Ticker, raw: &RawResponse) -> Result<Vec<NaiveDate>> {
    let result = first_option_chain(symbol, raw)?;

    Ok(result
        .expiration_dates
        .into_iter()
        .filter_map(expiration_from_epoch)
        .collect())
}

/// 만기별 옵션 응답에서 콜/풋 계약을 추출합니다.
///
/// 계약의 만기일은 요청한 만기일로 기록합니다.
pub fn parse_option_chain(
    symbol: &Ticker,
    expiration: NaiveDate,
    raw: &RawResponse,
) -> Result<Vec<OptionContract>> {
    let result = first_option_chain(symbol, raw)?;
    let fetched_at = Utc::now();

    let Some(chain) = result.options.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(returned) = chain.expiration_date.and_then(expiration_from_epoch) {
        if returned != expiration {
            debug!(symbol = %symbol, requested = %expiration, returned = %returned, "응답 만기일 불일치");
        }
    }

    let calls = chain
        .calls
        .into_iter()
        .map(|c| c.into_contract(symbol, expiration, OptionType::Call, fetched_at));
    let puts = chain
        .puts
        .into_iter()
        .map(|c| c.into_contract(symbol, expiration, OptionType::Put, fetched_at));

    Ok(calls.chain(puts).collect())
}

// ==================== Source ====================

/// Yahoo Finance 옵션 체인 소스.
///
/// `T`에는 보통 `RateLimitedClient<HttpTransport>`가 들어갑니다.
pub struct YahooOptionsSource<T> {
    transport: T,
}

impl<T: Transport> YahooOptionsSource<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> OptionsSource for YahooOptionsSource<T> {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn stock_info(&self, symbol: &Ticker) -> Result<StockInfo> {
        let raw = self
            .transport
            .fetch(&FetchRequest::StockInfo {
                symbol: symbol.clone(),
            })
            .await?;
        parse_stock_info(symbol, &raw)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn expirations(&self, symbol: &Ticker) -> Result<Vec<NaiveDate>> {
        let raw = self
            .transport
            .fetch(&FetchRequest::Expirations {
                symbol: symbol.clone(),
            })
            .await?;
        parse_expirations(symbol, &raw)
    }

    #[instrument(skip(self), fields(symbol = %symbol, expiration = %expiration))]
    async fn option_chain(
        &self,
        symbol: &Ticker,
        expiration: NaiveDate,
    ) -> Result<Vec<OptionContract>> {
        let raw = self
            .transport
            .fetch(&FetchRequest::OptionChain {
                symbol: symbol.clone(),
                expiration,
            })
            .await?;
        parse_option_chain(symbol, expiration, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn raw(body: &str) -> RawResponse {
        RawResponse::new(200, body)
    }

    #[test]
    fn test_parse_stock_info() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL","longName":"Apple Inc.",
            "shortName":"Apple","currency":"USD","exchangeName":"NMS","regularMarketPrice":227.5},
            "timestamp":[1737119400],"indicators":{"quote":[{"close":[227.5]}]}}],"error":null}}"#;

        let info = parse_stock_info(&aapl(), &raw(body)).unwrap();

        assert_eq!(info.symbol.as_str(), "AAPL");
        assert_eq!(info.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(info.exchange.as_deref(), Some("NMS"));
        assert_eq!(info.current_price, Some(227.5));
    }

    #[test]
    fn test_stock_info_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_stock_info(&aapl(), &raw(body)).unwrap_err();
        assert!(err.is_not_found());

        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse_stock_info(&aapl(), &raw(body)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let body = r#"{"chart":{"result":[{"meta":{"longName":"No symbol"}}],"error":null}}"#;
        let err = parse_stock_info(&aapl(), &raw(body)).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));

        let err = parse_stock_info(&aapl(), &raw("<html>oops</html>")).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn test_parse_expirations() {
        let body = r#"{"optionChain":{"result":[{"underlyingSymbol":"AAPL",
            "expirationDates":[1737072000,1737676800],"strikes":[150.0],"options":[]}],"error":null}}"#;

        let dates = parse_expirations(&aapl(), &raw(body)).unwrap();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 24).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_option_chain() {
        let body = r#"{"optionChain":{"result":[{"underlyingSymbol":"AAPL","expirationDates":[1737072000],
            "options":[{"expirationDate":1737072000,
              "calls":[{"contractSymbol":"AAPL250117C00150000","strike":150.0,"lastPrice":78.1,
                        "bid":77.5,"ask":78.6,"volume":12,"openInterest":3400,
                        "impliedVolatility":0.91,"inTheMoney":true,"lastTradeDate":1736870400}],
              "puts":[{"contractSymbol":"AAPL250117P00150000","strike":150.0,"bid":0.01,"ask":0.02},
                      {"contractSymbol":"AAPL250117P00155000","strike":155.0}]}]}],"error":null}}"#;
        let expiration = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();

        let contracts = parse_option_chain(&aapl(), expiration, &raw(body)).unwrap();

        assert_eq!(contracts.len(), 3);
        let call = &contracts[0];
        assert_eq!(call.option_type, OptionType::Call);
        assert_eq!(call.strike, 150.0);
        assert_eq!(call.volume, Some(12));
        assert_eq!(call.open_interest, Some(3400));
        assert_eq!(call.in_the_money, Some(true));
        assert!(call.last_trade_date.is_some());

        let puts: Vec<_> = contracts
            .iter()
            .filter(|c| c.option_type == OptionType::Put)
            .collect();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].bid, None);
        assert!(contracts.iter().all(|c| c.expiration_date == expiration));
    }

    #[test]
    fn test_contract_without_strike_is_parse_error() {
        let body = r#"{"optionChain":{"result":[{"options":[{"calls":[{"bid":1.0}],"puts":[]}]}],"error":null}}"#;
        let expiration = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        let err = parse_option_chain(&aapl(), expiration, &raw(body)).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }
}
