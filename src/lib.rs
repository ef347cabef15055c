//! Month-end closing price lookup over the Xueqiu monthly kline API.
//!
//! [`StockPriceLookup`] fetches a symbol's pre-adjusted monthly candles and
//! returns the close of the requested month. [`commands::get_stock_price`] is
//! the host-facing entry point: it always resolves to a [`CellValue`].

pub mod commands;
pub mod data;
pub mod engine;
pub mod errors;
pub mod lookup;
pub mod models;

use tracing_subscriber::EnvFilter;

pub use commands::{get_stock_price, CellValue};
pub use errors::{AppError, ErrorResponse};
pub use lookup::StockPriceLookup;
pub use models::config::{Credential, LookupConfig, MonthIndexing};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
