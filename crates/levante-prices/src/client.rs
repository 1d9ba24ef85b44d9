//! Chart-endpoint client for daily FX quotes.
//!
//! One request per symbol; the response nests closing levels under
//! `chart.result[0].indicators.quote[0].close`, with any of those layers
//! allowed to be absent. The client flattens whatever comes back into
//! date-keyed observations and leaves gap repair to the series layer.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime};
use levante_traits::Date;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{PriceError, Result};

/// Base URL for the quote source's chart endpoint.
pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Network timeout for a single symbol request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    close: Option<Vec<Option<f64>>>,
}

/// HTTP client for daily quote history.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: String,
}

impl QuoteClient {
    /// Create a client against the production endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_CHART_BASE_URL)
    }

    /// Create a client against an alternate base URL (tests, mirrors).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, symbol: &str, start: Date, end: Date) -> String {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // The endpoint treats period2 as exclusive; push it one day past.
        let period2 = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/{symbol}?period1={period1}&period2={period2}&interval=1d&events=history",
            self.base_url
        )
    }

    /// Fetch daily closes for one symbol over `[start, end]`.
    ///
    /// Observations come back date-keyed; a `None` close is an
    /// exchange-reported gap. Dates the source skips entirely (weekends)
    /// simply do not appear.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, an error payload, or a
    /// response with no usable result block.
    pub async fn fetch_history(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<(Date, Option<f64>)>> {
        let url = self.url(symbol, start, end);
        debug!(%url, "fetching quote history");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PriceError::Api(format!(
                "HTTP {} for {symbol}",
                response.status()
            )));
        }

        let parsed: ChartResponse = response.json().await?;
        if let Some(error) = parsed.chart.error {
            if !error.is_null() {
                return Err(PriceError::Api(error.to_string()));
            }
        }

        let result = parsed
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| PriceError::NoData(symbol.to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .and_then(|q| q.close)
            .unwrap_or_default();

        let observations = timestamps
            .into_iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                DateTime::from_timestamp(ts, 0).map(|dt| (dt.date_naive(), close))
            })
            .collect();
        Ok(observations)
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}
