use chrono::FixedOffset;
use tracing::{debug, info};

use crate::data::provider::KlineClient;
use crate::engine::scan;
use crate::errors::AppError;
use crate::models::config::{LookupConfig, MonthIndexing};
use crate::models::query::Query;

/// Month-end closing price lookup for one provider configuration.
///
/// Holds no mutable state: concurrent lookups share only the HTTP
/// connection pool.
#[derive(Debug, Clone)]
pub struct StockPriceLookup {
    client: KlineClient,
    month_indexing: MonthIndexing,
    offset: FixedOffset,
}

impl StockPriceLookup {
    pub fn new(config: &LookupConfig) -> Result<Self, AppError> {
        let client = KlineClient::new(config)?;
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            AppError::InvalidConfig(format!(
                "utc_offset_minutes {} is not a valid offset",
                config.utc_offset_minutes
            ))
        })?;

        Ok(Self {
            client,
            month_indexing: config.month_indexing,
            offset,
        })
    }

    pub fn month_indexing(&self) -> MonthIndexing {
        self.month_indexing
    }

    /// Closing price for `symbol` in (`year`, `month`), with `month`
    /// interpreted per the configured [`MonthIndexing`].
    ///
    /// `Ok(None)` means the fetched window has no row for that month (before
    /// listing, or further back than the lookback count).
    pub async fn lookup(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<f64>, AppError> {
        let query = Query::new(symbol, year, month, self.month_indexing)?;
        self.lookup_query(&query).await
    }

    pub async fn lookup_query(&self, query: &Query) -> Result<Option<f64>, AppError> {
        info!(
            "Looking up close: symbol={}, month={}-{:02}",
            query.symbol,
            query.year,
            query.month()
        );

        let series = self.client.fetch_monthly(&query.symbol).await?;
        let found = scan::find_monthly_record(&series, query.year, query.month0, self.offset)?;

        match &found {
            Some(record) => debug!(
                "Matched {} row at {} ms: close={}",
                query.symbol, record.timestamp_ms, record.close
            ),
            None => info!(
                "No row for {} in {}-{:02} among {} months",
                query.symbol,
                query.year,
                query.month(),
                series.len()
            ),
        }

        Ok(found.map(|r| r.close))
    }
}
