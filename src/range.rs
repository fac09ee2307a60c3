use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{AtencionesError, Result};

/// Calendar-day range selected by the user. Either end may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self::new(Some(day), Some(day))
    }

    pub fn today() -> Self {
        Self::single_day(Local::now().date_naive())
    }

    pub fn yesterday() -> Self {
        Self::day_before(Local::now().date_naive())
    }

    /// The single day before `day`.
    pub fn day_before(day: NaiveDate) -> Self {
        Self::single_day(day.checked_sub_days(Days::new(1)).unwrap_or(day))
    }

    /// Both ends, or `None` while the range is incomplete.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }

    pub fn is_complete(&self) -> bool {
        self.bounds().is_some()
    }

    /// Whole-day query in local time, or `InvalidRange` when incomplete.
    pub fn query(&self) -> Result<RangeQuery> {
        let (start, end) = self.bounds().ok_or(AtencionesError::InvalidRange)?;
        RangeQuery::for_days(start, end, &Local)
    }

    pub fn label(&self) -> String {
        let show = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "\u{2014}".to_string())
        };
        format!("{} a {}", show(self.start), show(self.end))
    }
}

/// Parse a `YYYY-MM-DD` date as typed by the user. Blank input is `None`.
pub fn parse_day(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AtencionesError::InvalidDate(input.to_string()))
}

/// Instants sent to the backend for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
}

impl RangeQuery {
    /// Expand `start` to 00:00:00.000 and `end` to 23:59:59.999 in `tz`.
    pub fn for_days<Tz: TimeZone>(start: NaiveDate, end: NaiveDate, tz: &Tz) -> Result<Self> {
        let (first, _) = day_span(start, tz)?;
        let (_, last) = day_span(end, tz)?;
        Ok(Self {
            start: first.with_timezone(&Utc),
            end: last.with_timezone(&Utc),
            start_day: start,
            end_day: end,
        })
    }

    /// ISO-8601 in UTC with milliseconds, e.g. `2024-01-01T05:00:00.000Z`.
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// First and last millisecond of `day` in `tz`. Days whose midnight falls in
/// a DST gap start at the earliest valid instant.
pub fn day_span<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let start = local_instant(day.and_hms_milli_opt(0, 0, 0, 0), tz, true)?;
    let end = local_instant(day.and_hms_milli_opt(23, 59, 59, 999), tz, false)?;
    Ok((start, end))
}

fn local_instant<Tz: TimeZone>(
    naive: Option<NaiveDateTime>,
    tz: &Tz,
    earliest: bool,
) -> Result<DateTime<Tz>> {
    let naive = naive.ok_or_else(|| AtencionesError::Other("invalid time of day".to_string()))?;
    let mapped = tz.from_local_datetime(&naive);
    let instant = if earliest {
        mapped.earliest()
    } else {
        mapped.latest()
    };
    instant
        .or_else(|| {
            // Inside a DST gap: step forward (start) or back (end) an hour.
            let shifted = if earliest {
                naive + chrono::Duration::hours(1)
            } else {
                naive - chrono::Duration::hours(1)
            };
            tz.from_local_datetime(&shifted).earliest()
        })
        .ok_or_else(|| AtencionesError::Other(format!("{naive} does not exist locally")))
}

/// `atenciones_YYYYMMDD_a_YYYYMMDD.xlsx`
pub fn export_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "atenciones_{}_a_{}.xlsx",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}
