//! HTTP client for the daily event exports.
//!
//! One archive per calendar date, addressed by the compact numeric date.
//! An absent date (HTTP 404) is a normal outcome — the source simply has
//! nothing published for that day — and is kept distinct from transient
//! failures, which the aggregator absorbs per day.

use std::io::{Cursor, Read};
use std::time::Duration;

use async_trait::async_trait;
use levante_traits::Date;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::schema::{EventSchema, RawEvent, parse_record};
use crate::{GdeltError, Result};

/// Base URL for the GDELT 1.0 daily event exports.
pub const GDELT_EVENTS_BASE_URL: &str = "http://data.gdeltproject.org/events";

/// Network timeout for a single archive download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(90);

/// What the feed held for one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub enum DayFeed {
    /// No archive published for this date.
    Absent,
    /// The archive exists but its column count matches no known revision.
    UnknownSchema {
        /// Number of columns observed in the first record.
        columns: usize,
    },
    /// Parsed event records (rows with invalid core fields already dropped).
    Events(Vec<RawEvent>),
}

/// Anything that can produce a day's worth of raw events.
///
/// The aggregator depends on this capability rather than on the concrete
/// HTTP client, so tests can substitute a stub that fails on contact to
/// prove a cache hit never touches the network.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch and parse the feed for one calendar date.
    async fn fetch_day(&self, date: Date) -> Result<DayFeed>;
}

/// HTTP client for the daily event archive.
#[derive(Debug, Clone)]
pub struct EventsClient {
    client: Client,
    base_url: String,
}

impl EventsClient {
    /// Create a client against the production archive.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(GDELT_EVENTS_BASE_URL)
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

    /// Archive URL for one date.
    fn url(&self, date: Date) -> String {
        format!("{}/{}.export.CSV.zip", self.base_url, date.format("%Y%m%d"))
    }

    /// Download and parse one day's archive.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-2xx status other than
    /// 404, or an undecodable archive. A 404 yields [`DayFeed::Absent`].
    pub async fn fetch_day_feed(&self, date: Date) -> Result<DayFeed> {
        let url = self.url(date);
        debug!(%url, "fetching day archive");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DayFeed::Absent);
        }
        if !response.status().is_success() {
            return Err(GdeltError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        parse_archive(&bytes)
    }
}

impl Default for EventsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for EventsClient {
    async fn fetch_day(&self, date: Date) -> Result<DayFeed> {
        self.fetch_day_feed(date).await
    }
}

/// Decode a zip archive holding one tab-separated event table.
///
/// The schema revision is detected from the first record's field count;
/// records that fail row-level validation are dropped, not fatal.
///
/// # Errors
///
/// Returns an error if the zip container or the delimited reader is
/// unreadable.
pub(crate) fn parse_archive(bytes: &[u8]) -> Result<DayFeed> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if archive.is_empty() {
        return Ok(DayFeed::Events(Vec::new()));
    }

    let mut raw = Vec::new();
    archive.by_index(0)?.read_to_end(&mut raw)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_slice());

    let mut schema: Option<EventSchema> = None;
    let mut events = Vec::new();

    for result in reader.records() {
        let record = result?;
        let current = match schema {
            Some(s) => s,
            None => match EventSchema::detect(record.len()) {
                Some(s) => {
                    schema = Some(s);
                    s
                }
                None => {
                    return Ok(DayFeed::UnknownSchema {
                        columns: record.len(),
                    });
                }
            },
        };
        if let Some(event) = parse_record(&record, current.columns()) {
            events.push(event);
        }
    }

    Ok(DayFeed::Events(events))
}
