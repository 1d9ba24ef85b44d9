//! Event-export schema revisions and record parsing.
//!
//! The GDELT 1.0 daily export is a headerless tab-separated table whose
//! column layout differs between revisions. Rather than probing column
//! names at runtime, the revision is detected once from the field count
//! and carries a fixed field-index mapping.

use levante_traits::Date;

/// One parsed news-event observation.
///
/// Ephemeral: raw events exist only while a single day is being
/// aggregated and are never persisted individually.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Source-assigned global event identifier.
    pub event_id: i64,
    /// The date the event occurred (not the date it was reported).
    pub event_date: Date,
    /// Actor-1 country code, uppercase.
    pub country: String,
    /// Whether the source flagged this as the originating report.
    pub is_root: bool,
    /// Number of source-document mentions.
    pub num_mentions: u32,
    /// Source-reported sentiment polarity.
    pub avg_tone: f64,
}

/// Field indices for one schema revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// GLOBALEVENTID column.
    pub event_id: usize,
    /// SQLDATE column (YYYYMMDD integer).
    pub event_date: usize,
    /// Actor1CountryCode column.
    pub actor_country: usize,
    /// IsRootEvent column.
    pub is_root: usize,
    /// NumMentions column.
    pub num_mentions: usize,
    /// AvgTone column.
    pub avg_tone: usize,
}

/// A recognized export-schema revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSchema {
    /// 58-column layout used by older daily exports.
    V1,
    /// 61-or-more-column layout used by current exports.
    V2,
}

impl EventSchema {
    /// Detect the schema revision from the record field count.
    ///
    /// Returns `None` for unrecognized layouts; callers treat that as an
    /// empty day, never as a hard failure.
    #[must_use]
    pub const fn detect(column_count: usize) -> Option<Self> {
        if column_count == 58 {
            Some(Self::V1)
        } else if column_count >= 61 {
            Some(Self::V2)
        } else {
            None
        }
    }

    /// The field-index mapping for this revision.
    #[must_use]
    pub const fn columns(self) -> ColumnLayout {
        match self {
            Self::V1 => ColumnLayout {
                event_id: 0,
                event_date: 1,
                actor_country: 7,
                is_root: 25,
                num_mentions: 31,
                avg_tone: 34,
            },
            Self::V2 => ColumnLayout {
                event_id: 0,
                event_date: 1,
                actor_country: 7,
                is_root: 26,
                num_mentions: 31,
                avg_tone: 34,
            },
        }
    }
}

/// Parse one delimited record into a [`RawEvent`].
///
/// Returns `None` when a core field (date, country, tone) is missing or
/// invalid; such rows are dropped silently, matching the feed's habit of
/// shipping partially filled records. The source marks missing values
/// with `---` or an empty field.
#[must_use]
pub fn parse_record(record: &csv::StringRecord, layout: ColumnLayout) -> Option<RawEvent> {
    let event_date = parse_sql_date(field(record, layout.event_date)?)?;
    let country = field(record, layout.actor_country)?.to_ascii_uppercase();
    let avg_tone = field(record, layout.avg_tone)?.parse::<f64>().ok()?;
    if !avg_tone.is_finite() {
        return None;
    }

    // Non-core fields degrade to neutral defaults instead of dropping the row.
    let event_id = field(record, layout.event_id)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    let is_root = field(record, layout.is_root)
        .and_then(|s| s.parse::<i64>().ok())
        .is_some_and(|v| v != 0);
    let num_mentions = field(record, layout.num_mentions)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or(0, |v| v as u32);

    Some(RawEvent {
        event_id,
        event_date,
        country,
        is_root,
        num_mentions,
        avg_tone,
    })
}

fn field(record: &csv::StringRecord, idx: usize) -> Option<&str> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "---")
}

/// Parse a YYYYMMDD integer date as shipped in the SQLDATE column.
fn parse_sql_date(s: &str) -> Option<Date> {
    let v: u32 = s.parse().ok()?;
    let year = (v / 10_000) as i32;
    let month = v / 100 % 100;
    let day = v % 100;
    Date::from_ymd_opt(year, month, day)
}
