use serde::{Deserialize, Serialize};

use super::config::MonthIndexing;
use crate::errors::AppError;

/// One lookup request: which symbol, which calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Exchange-prefixed ticker (e.g. `SH600519`). Opaque here; only the
    /// provider decides whether it exists.
    pub symbol: String,
    pub year: i32,
    /// 0-indexed calendar month (0 = January)
    pub month0: u32,
}

impl Query {
    /// Build a query from caller arguments, interpreting `month` per `indexing`.
    pub fn new(
        symbol: &str,
        year: i32,
        month: u32,
        indexing: MonthIndexing,
    ) -> Result<Self, AppError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AppError::InvalidQuery("symbol is empty".into()));
        }
        if !(1..=9999).contains(&year) {
            return Err(AppError::InvalidQuery(format!("year {} out of range", year)));
        }
        let month0 = indexing.to_month0(month).ok_or_else(|| {
            let (lo, hi) = indexing.valid_range();
            AppError::InvalidQuery(format!("month {} outside {}..={}", month, lo, hi))
        })?;

        Ok(Query {
            symbol: symbol.to_string(),
            year,
            month0,
        })
    }

    /// Build a query from host-supplied numbers. Spreadsheet cells hand over
    /// floats; anything non-integral is rejected rather than truncated.
    pub fn from_cell(
        symbol: &str,
        year: f64,
        month: f64,
        indexing: MonthIndexing,
    ) -> Result<Self, AppError> {
        let year = whole_number(year, "year")?;
        let month = whole_number(month, "month")?;
        if month < 0 {
            return Err(AppError::InvalidQuery(format!("month {} is negative", month)));
        }
        let year = i32::try_from(year)
            .map_err(|_| AppError::InvalidQuery(format!("year {} out of range", year)))?;
        let month = u32::try_from(month)
            .map_err(|_| AppError::InvalidQuery(format!("month {} out of range", month)))?;
        Query::new(symbol, year, month, indexing)
    }

    /// 1-indexed month, for display.
    pub fn month(&self) -> u32 {
        self.month0 + 1
    }
}

fn whole_number(value: f64, what: &str) -> Result<i64, AppError> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(AppError::InvalidQuery(format!(
            "{} must be a whole number, got {}",
            what, value
        )));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_based_query() {
        let q = Query::new(" SH600519 ", 2022, 12, MonthIndexing::OneBased).unwrap();
        assert_eq!(q.symbol, "SH600519");
        assert_eq!(q.month0, 11);
        assert_eq!(q.month(), 12);
    }

    #[test]
    fn test_zero_based_query() {
        let q = Query::new("AAPL", 2020, 0, MonthIndexing::ZeroBased).unwrap();
        assert_eq!(q.month0, 0);
        assert!(Query::new("AAPL", 2020, 12, MonthIndexing::ZeroBased).is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Query::new("", 2020, 1, MonthIndexing::OneBased).is_err());
        assert!(Query::new("AAPL", 2020, 0, MonthIndexing::OneBased).is_err());
        assert!(Query::new("AAPL", 2020, 13, MonthIndexing::OneBased).is_err());
        assert!(Query::new("AAPL", 0, 1, MonthIndexing::OneBased).is_err());
    }

    #[test]
    fn test_from_cell() {
        let q = Query::from_cell("SZ000001", 2019.0, 3.0, MonthIndexing::OneBased).unwrap();
        assert_eq!((q.year, q.month0), (2019, 2));

        assert!(Query::from_cell("SZ000001", 2019.5, 3.0, MonthIndexing::OneBased).is_err());
        assert!(Query::from_cell("SZ000001", 2019.0, f64::NAN, MonthIndexing::OneBased).is_err());
        assert!(Query::from_cell("SZ000001", 2019.0, -1.0, MonthIndexing::OneBased).is_err());
    }
}
