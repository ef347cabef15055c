use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;

pub const DEFAULT_BASE_URL: &str = "https://stock.xueqiu.com";
pub const DEFAULT_SITE_URL: &str = "https://xueqiu.com";
pub const KLINE_PATH: &str = "/v5/stock/chart/kline.json";

/// Number of most recent monthly buckets requested (about 23.6 years).
pub const DEFAULT_LOOKBACK_COUNT: u32 = 284;

/// Indicators requested alongside the kline. Only the kline columns are read.
pub const INDICATORS: &str = "kline,pe,pb,ps,pcf,market_capital,agt,ggt,balance";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Environment variable holding the session cookie.
pub const COOKIE_ENV: &str = "XQ_COOKIE";

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Session cookie sent to the provider. Supplied per deployment and
/// refreshed out-of-band; never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Credential(cookie.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// How the caller's `month` argument is interpreted.
///
/// `OneBased` (1 = January) is the default. `ZeroBased` (0 = January)
/// reproduces callers that pass the month the way a 0-indexed date API
/// reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthIndexing {
    #[default]
    OneBased,
    ZeroBased,
}

impl MonthIndexing {
    /// Convert a caller month into a 0-indexed calendar month (0..=11).
    pub fn to_month0(&self, month: u32) -> Option<u32> {
        let month0 = match self {
            MonthIndexing::OneBased => month.checked_sub(1)?,
            MonthIndexing::ZeroBased => month,
        };
        (month0 < 12).then_some(month0)
    }

    pub fn valid_range(&self) -> (u32, u32) {
        match self {
            MonthIndexing::OneBased => (1, 12),
            MonthIndexing::ZeroBased => (0, 11),
        }
    }
}

/// Lookup configuration. Every field has a default, so a partial JSON file
/// only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Origin of the kline API
    pub base_url: String,
    /// Provider web site, used for `Origin` and `Referer`
    pub site_url: String,
    pub credential: Option<Credential>,
    pub user_agent: String,
    pub accept_language: String,
    pub lookback_count: u32,
    pub month_indexing: MonthIndexing,
    /// Offset applied before bucketing record timestamps into months (0 = UTC)
    pub utc_offset_minutes: i32,
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            credential: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            lookback_count: DEFAULT_LOOKBACK_COUNT,
            month_indexing: MonthIndexing::OneBased,
            utc_offset_minutes: 0,
            timeout_secs: 10,
        }
    }
}

impl LookupConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: LookupConfig = serde_json::from_str(&content).map_err(|e| {
            AppError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        info!("Loaded lookup config from {}", path.display());
        Ok(config)
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Override the credential from `XQ_COOKIE` when it is set and non-blank.
    pub fn with_env_credential(self) -> Self {
        self.with_credential_from(std::env::var(COOKIE_ENV).ok())
    }

    fn with_credential_from(self, value: Option<String>) -> Self {
        match value {
            Some(cookie) if !cookie.trim().is_empty() => {
                self.with_credential(Credential::new(cookie.trim()))
            }
            _ => self,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::InvalidConfig("base_url is empty".into()));
        }
        if self.lookback_count == 0 {
            return Err(AppError::InvalidConfig("lookback_count must be > 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidConfig("timeout_secs must be > 0".into()));
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(AppError::InvalidConfig(format!(
                "utc_offset_minutes {} outside ±{}",
                self.utc_offset_minutes, MAX_OFFSET_MINUTES
            )));
        }
        Ok(())
    }
}
