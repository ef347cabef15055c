use serde::Serialize;
use tracing::error;

use crate::errors::{AppError, ErrorResponse};
use crate::lookup::StockPriceLookup;
use crate::models::query::Query;

/// What a spreadsheet cell receives from a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Number(f64),
    /// No row for the requested month
    Empty,
    Error(ErrorResponse),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Result<Option<f64>, AppError>> for CellValue {
    fn from(result: Result<Option<f64>, AppError>) -> Self {
        match result {
            Ok(Some(close)) => CellValue::Number(close),
            Ok(None) => CellValue::Empty,
            Err(err) => CellValue::Error(ErrorResponse::from(&err)),
        }
    }
}

// ── Host Commands ──

/// Month-end closing price for a cell: `(symbol, year, month)` as the host
/// hands them over. Every failure comes back as [`CellValue::Error`].
pub async fn get_stock_price(
    lookup: &StockPriceLookup,
    symbol: &str,
    year: f64,
    month: f64,
) -> CellValue {
    let result = match Query::from_cell(symbol, year, month, lookup.month_indexing()) {
        Ok(query) => lookup.lookup_query(&query).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        error!("get_stock_price({}, {}, {}) failed: {}", symbol, year, month, e);
    }
    CellValue::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::fixture::{monthly_body, serve};
    use crate::models::config::LookupConfig;

    #[tokio::test]
    async fn test_number_cell() {
        let server = serve("200 OK", monthly_body(2020, 2020, 0.5)).await;
        let lookup = StockPriceLookup::new(&server.config()).unwrap();

        let cell = get_stock_price(&lookup, "SH600519", 2020.0, 4.0).await;
        assert_eq!(cell.as_number(), Some(202004.5));
    }

    #[tokio::test]
    async fn test_empty_cell() {
        let server = serve("200 OK", monthly_body(2020, 2020, 0.0)).await;
        let lookup = StockPriceLookup::new(&server.config()).unwrap();

        let cell = get_stock_price(&lookup, "SH600519", 1990.0, 1.0).await;
        assert_eq!(cell, CellValue::Empty);
    }

    #[tokio::test]
    async fn test_error_cells() {
        let server = serve("404 Not Found", "{}".to_string()).await;
        let lookup = StockPriceLookup::new(&server.config()).unwrap();

        match get_stock_price(&lookup, "SH600519", 2020.0, 1.0).await {
            CellValue::Error(resp) => {
                assert_eq!(resp.code, "REQUEST_FAILED");
                assert!(resp.message.contains("Not Found"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        match get_stock_price(&lookup, "SH600519", 2020.0, 13.0).await {
            CellValue::Error(resp) => assert_eq!(resp.code, "INVALID_QUERY"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_cell() {
        let server = serve("200 OK", "not json".to_string()).await;
        let lookup = StockPriceLookup::new(&LookupConfig {
            base_url: server.base_url.clone(),
            ..Default::default()
        })
        .unwrap();

        match get_stock_price(&lookup, "SH600519", 2020.0, 1.0).await {
            CellValue::Error(resp) => assert_eq!(resp.code, "MALFORMED_RESPONSE"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_cell_serialization() {
        let json = serde_json::to_value(CellValue::Number(12.5)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "number", "value": 12.5}));

        let json = serde_json::to_value(CellValue::Empty).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "empty"}));
    }
}
