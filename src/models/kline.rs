use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;

/// Fixed positions used when the response carries no column header.
pub const TIMESTAMP_INDEX: usize = 0;
pub const CLOSE_INDEX: usize = 5;

/// A decoded monthly candle: bucket timestamp and its closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineRecord {
    /// UTC epoch milliseconds
    pub timestamp_ms: i64,
    pub close: f64,
}

/// Response envelope as the provider sends it.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    column: Vec<String>,
    #[serde(default)]
    item: Option<Value>,
}

/// Monthly kline rows in provider order (ascending by timestamp).
///
/// Rows stay as raw JSON cells; a row's timestamp and close are only decoded
/// when the scan reaches it.
#[derive(Debug, Clone)]
pub struct KlineSeries {
    timestamp_index: usize,
    close_index: usize,
    rows: Vec<Value>,
}

impl KlineSeries {
    /// Decode a response body.
    pub fn from_json(body: &str) -> Result<Self, AppError> {
        let envelope: RawEnvelope = serde_json::from_str(body)?;

        if envelope.error_code != 0 {
            return Err(AppError::RequestFailed(format!(
                "provider error {}: {}",
                envelope.error_code,
                envelope.error_description.unwrap_or_default()
            )));
        }

        let data = envelope
            .data
            .ok_or_else(|| AppError::MalformedResponse("missing data".into()))?;

        let rows = match data.item {
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                return Err(AppError::MalformedResponse(
                    "data.item is not an array".into(),
                ))
            }
            None => return Err(AppError::MalformedResponse("missing data.item".into())),
        };

        let position = |name: &str, fallback: usize| {
            data.column
                .iter()
                .position(|c| c == name)
                .unwrap_or(fallback)
        };

        Ok(KlineSeries {
            timestamp_index: position("timestamp", TIMESTAMP_INDEX),
            close_index: position("close", CLOSE_INDEX),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamp (epoch millis) of row `i`.
    pub fn timestamp(&self, i: usize) -> Result<i64, AppError> {
        let cell = self.cell(i, self.timestamp_index, "timestamp")?;
        if let Some(ms) = cell.as_i64() {
            return Ok(ms);
        }
        match cell.as_f64() {
            Some(ms) if ms.fract() == 0.0 && ms.abs() < i64::MAX as f64 => Ok(ms as i64),
            _ => Err(AppError::MalformedResponse(format!(
                "row {} timestamp is not an integer: {}",
                i, cell
            ))),
        }
    }

    /// Closing price of row `i`.
    pub fn close(&self, i: usize) -> Result<f64, AppError> {
        let cell = self.cell(i, self.close_index, "close")?;
        cell.as_f64().ok_or_else(|| {
            AppError::MalformedResponse(format!("row {} close is not a number: {}", i, cell))
        })
    }

    /// Fully decoded row `i`.
    pub fn record(&self, i: usize) -> Result<KlineRecord, AppError> {
        Ok(KlineRecord {
            timestamp_ms: self.timestamp(i)?,
            close: self.close(i)?,
        })
    }

    fn cell(&self, i: usize, index: usize, name: &str) -> Result<&Value, AppError> {
        let row = self
            .rows
            .get(i)
            .ok_or_else(|| AppError::MalformedResponse(format!("row {} out of bounds", i)))?;
        let cells = row
            .as_array()
            .ok_or_else(|| AppError::MalformedResponse(format!("row {} is not an array", i)))?;
        cells.get(index).ok_or_else(|| {
            AppError::MalformedResponse(format!("row {} has no {} at index {}", i, name, index))
        })
    }
}
