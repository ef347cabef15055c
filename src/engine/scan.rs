use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};

use crate::errors::AppError;
use crate::models::kline::{KlineRecord, KlineSeries};

/// Calendar (year, 0-indexed month) of an epoch-millis timestamp, shifted by
/// `offset` before bucketing.
pub fn month_of(timestamp_ms: i64, offset: FixedOffset) -> Result<(i32, u32), AppError> {
    let utc: DateTime<Utc> = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| {
            AppError::MalformedResponse(format!("timestamp {} out of range", timestamp_ms))
        })?;
    let local = utc.with_timezone(&offset);
    Ok((local.year(), local.month0()))
}

/// Walk `series` from the most recent row back and return the first row that
/// falls in (`year`, `month0`).
///
/// Rows before the match are never decoded, so a bad cell older than the
/// match does not fail the lookup.
pub fn find_monthly_record(
    series: &KlineSeries,
    year: i32,
    month0: u32,
    offset: FixedOffset,
) -> Result<Option<KlineRecord>, AppError> {
    for i in (0..series.len()).rev() {
        let (y, m) = month_of(series.timestamp(i)?, offset)?;
        if y == year && m == month0 {
            return series.record(i).map(Some);
        }
    }
    Ok(None)
}

/// Closing price of the month's row, if the series has one.
pub fn find_monthly_close(
    series: &KlineSeries,
    year: i32,
    month0: u32,
    offset: FixedOffset,
) -> Result<Option<f64>, AppError> {
    Ok(find_monthly_record(series, year, month0, offset)?.map(|r| r.close))
}
